use std::{path::Path, sync::Arc};

use serde::Serialize;
use shared::{
    domain::WorkerId,
    protocol::{CreateWorkerRequest, Paginated, UpdateWorkerRequest, Worker, WorkerProcess},
};

use crate::{
    error::{ClientError, ClientResult},
    transport::{ApiRequest, ApiService},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct WorkerQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CvUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl CvUpload {
    pub async fn from_path(path: &Path) -> ClientResult<Self> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ClientError::validation("CV path has no file name"))?
            .to_string();
        let mime_type = match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("pdf") => Some("application/pdf".to_string()),
            Some("doc") => Some("application/msword".to_string()),
            Some("docx") => Some(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_string(),
            ),
            _ => None,
        };
        let bytes = tokio::fs::read(path).await?;
        Ok(Self {
            filename,
            mime_type,
            bytes,
        })
    }
}

#[derive(Clone)]
pub struct WorkerService {
    api: Arc<ApiService>,
}

impl WorkerService {
    pub fn new(api: Arc<ApiService>) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &WorkerQuery) -> ClientResult<Paginated<Worker>> {
        self.api
            .send(ApiRequest::get(&["workers"]).query(query)?)
            .await
    }

    pub async fn get(&self, id: WorkerId) -> ClientResult<Worker> {
        self.api
            .send(ApiRequest::get(&["workers", &id.to_string()]))
            .await
    }

    pub async fn create(&self, request: &CreateWorkerRequest) -> ClientResult<Worker> {
        self.api
            .send(ApiRequest::post(&["workers"]).json(request)?)
            .await
    }

    pub async fn update(&self, id: WorkerId, request: &UpdateWorkerRequest) -> ClientResult<Worker> {
        self.api
            .send(ApiRequest::patch(&["workers", &id.to_string()]).json(request)?)
            .await
    }

    pub async fn delete(&self, id: WorkerId) -> ClientResult<()> {
        self.api
            .send_empty(ApiRequest::delete(&["workers", &id.to_string()]))
            .await
    }

    /// Applications of the signed-in worker.
    pub async fn my_processes(&self) -> ClientResult<Vec<WorkerProcess>> {
        self.api
            .send(ApiRequest::get(&["workers", "me", "processes"]))
            .await
    }

    pub async fn upload_cv(&self, id: WorkerId, upload: CvUpload) -> ClientResult<Worker> {
        let request = ApiRequest::post(&["workers", &id.to_string(), "cv"]).file(
            "file",
            upload.filename,
            upload.mime_type,
            upload.bytes,
        );
        self.api.send(request).await
    }
}
