use std::sync::Arc;

use serde::Serialize;
use shared::{
    domain::{InvitationStatus, ProcessId, ProcessInvitationId},
    protocol::{
        BulkInviteResponse, BulkProcessInvitationRequest, CreateProcessInvitationRequest,
        ProcessInvitation, WorkerProcess,
    },
};

use crate::{
    error::ClientResult,
    transport::{ApiRequest, ApiService},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInvitationQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_id: Option<ProcessId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvitationStatus>,
}

/// Invitations for a worker to apply to a selection process.
#[derive(Clone)]
pub struct ProcessInvitationService {
    api: Arc<ApiService>,
}

impl ProcessInvitationService {
    pub fn new(api: Arc<ApiService>) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &ProcessInvitationQuery) -> ClientResult<Vec<ProcessInvitation>> {
        self.api
            .send(ApiRequest::get(&["process-invitations"]).query(query)?)
            .await
    }

    pub async fn create(
        &self,
        request: &CreateProcessInvitationRequest,
    ) -> ClientResult<ProcessInvitation> {
        self.api
            .send(ApiRequest::post(&["process-invitations"]).json(request)?)
            .await
    }

    pub async fn bulk_create(
        &self,
        request: &BulkProcessInvitationRequest,
    ) -> ClientResult<BulkInviteResponse> {
        self.api
            .send(ApiRequest::post(&["process-invitations", "bulk"]).json(request)?)
            .await
    }

    pub async fn cancel(&self, id: ProcessInvitationId) -> ClientResult<ProcessInvitation> {
        self.api
            .send(ApiRequest::patch(&[
                "process-invitations",
                &id.to_string(),
                "cancel",
            ]))
            .await
    }

    pub async fn resend(&self, id: ProcessInvitationId) -> ClientResult<()> {
        self.api
            .send_empty(ApiRequest::post(&[
                "process-invitations",
                &id.to_string(),
                "resend",
            ]))
            .await
    }

    pub async fn by_token(&self, token: &str) -> ClientResult<ProcessInvitation> {
        self.api
            .send(ApiRequest::get(&["process-invitations", "token", token]))
            .await
    }

    pub async fn accept(&self, token: &str) -> ClientResult<WorkerProcess> {
        self.api
            .send(ApiRequest::post(&[
                "process-invitations",
                "token",
                token,
                "accept",
            ]))
            .await
    }
}
