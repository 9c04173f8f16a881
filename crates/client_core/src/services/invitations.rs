use std::sync::Arc;

use serde::Serialize;
use shared::{
    domain::{InvitationId, InvitationStatus},
    protocol::{CreateInvitationRequest, Invitation},
};

use crate::{
    error::ClientResult,
    transport::{ApiRequest, ApiService},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct InvitationQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvitationStatus>,
}

/// Company invitations: a guest is invited to join a company account.
#[derive(Clone)]
pub struct InvitationService {
    api: Arc<ApiService>,
}

impl InvitationService {
    pub fn new(api: Arc<ApiService>) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &InvitationQuery) -> ClientResult<Vec<Invitation>> {
        self.api
            .send(ApiRequest::get(&["invitations"]).query(query)?)
            .await
    }

    pub async fn create(&self, request: &CreateInvitationRequest) -> ClientResult<Invitation> {
        self.api
            .send(ApiRequest::post(&["invitations"]).json(request)?)
            .await
    }

    pub async fn cancel(&self, id: InvitationId) -> ClientResult<Invitation> {
        self.api
            .send(ApiRequest::patch(&["invitations", &id.to_string(), "cancel"]))
            .await
    }

    pub async fn resend(&self, id: InvitationId) -> ClientResult<()> {
        self.api
            .send_empty(ApiRequest::post(&["invitations", &id.to_string(), "resend"]))
            .await
    }

    pub async fn by_token(&self, token: &str) -> ClientResult<Invitation> {
        self.api
            .send(ApiRequest::get(&["invitations", "token", token]))
            .await
    }

    pub async fn accept(&self, token: &str) -> ClientResult<Invitation> {
        self.api
            .send(ApiRequest::post(&["invitations", "token", token, "accept"]))
            .await
    }
}
