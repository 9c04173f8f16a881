use std::sync::Arc;

use serde::Serialize;
use shared::{
    domain::{ProcessId, ReportId, ReportStatus, WorkerId},
    protocol::{CreateReportRequest, RejectReportRequest, Report, UpdateReportRequest},
};

use crate::{
    error::ClientResult,
    transport::{ApiRequest, ApiService},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReportStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<WorkerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_id: Option<ProcessId>,
}

#[derive(Clone)]
pub struct ReportService {
    api: Arc<ApiService>,
}

impl ReportService {
    pub fn new(api: Arc<ApiService>) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &ReportQuery) -> ClientResult<Vec<Report>> {
        self.api
            .send(ApiRequest::get(&["reports"]).query(query)?)
            .await
    }

    pub async fn get(&self, id: ReportId) -> ClientResult<Report> {
        self.api
            .send(ApiRequest::get(&["reports", &id.to_string()]))
            .await
    }

    pub async fn create(&self, request: &CreateReportRequest) -> ClientResult<Report> {
        self.api
            .send(ApiRequest::post(&["reports"]).json(request)?)
            .await
    }

    pub async fn update(&self, id: ReportId, request: &UpdateReportRequest) -> ClientResult<Report> {
        self.api
            .send(ApiRequest::patch(&["reports", &id.to_string()]).json(request)?)
            .await
    }

    pub async fn delete(&self, id: ReportId) -> ClientResult<()> {
        self.api
            .send_empty(ApiRequest::delete(&["reports", &id.to_string()]))
            .await
    }

    pub async fn submit(&self, id: ReportId) -> ClientResult<Report> {
        self.transition(id, "submit").await
    }

    pub async fn approve(&self, id: ReportId) -> ClientResult<Report> {
        self.transition(id, "approve").await
    }

    pub async fn reject(&self, id: ReportId, request: &RejectReportRequest) -> ClientResult<Report> {
        self.api
            .send(ApiRequest::post(&["reports", &id.to_string(), "reject"]).json(request)?)
            .await
    }

    async fn transition(&self, id: ReportId, action: &str) -> ClientResult<Report> {
        self.api
            .send(ApiRequest::post(&["reports", &id.to_string(), action]))
            .await
    }
}
