use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    domain::UserId,
    protocol::{AuditLog, Paginated},
};

use crate::{
    error::ClientResult,
    transport::{ApiRequest, ApiService},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct AuditService {
    api: Arc<ApiService>,
}

impl AuditService {
    pub fn new(api: Arc<ApiService>) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &AuditQuery) -> ClientResult<Paginated<AuditLog>> {
        self.api
            .send(ApiRequest::get(&["audit"]).query(query)?)
            .await
    }
}
