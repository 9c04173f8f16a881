use std::sync::Arc;

use shared::protocol::ContactMessage;

use crate::{
    error::ClientResult,
    transport::{ApiRequest, ApiService},
};

/// Public contact form; no session required.
#[derive(Clone)]
pub struct ContactService {
    api: Arc<ApiService>,
}

impl ContactService {
    pub fn new(api: Arc<ApiService>) -> Self {
        Self { api }
    }

    pub async fn send(&self, message: &ContactMessage) -> ClientResult<()> {
        self.api
            .send_empty(ApiRequest::post(&["contact"]).json(message)?)
            .await
    }
}
