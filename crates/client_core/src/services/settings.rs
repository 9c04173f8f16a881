use std::sync::Arc;

use shared::protocol::{Setting, UpdateSettingRequest};

use crate::{
    error::ClientResult,
    transport::{ApiRequest, ApiService},
};

#[derive(Clone)]
pub struct SettingsService {
    api: Arc<ApiService>,
}

impl SettingsService {
    pub fn new(api: Arc<ApiService>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> ClientResult<Vec<Setting>> {
        self.api.send(ApiRequest::get(&["settings"])).await
    }

    pub async fn get(&self, key: &str) -> ClientResult<Setting> {
        self.api.send(ApiRequest::get(&["settings", key])).await
    }

    pub async fn update(&self, key: &str, value: serde_json::Value) -> ClientResult<Setting> {
        self.api
            .send(ApiRequest::put(&["settings", key]).json(&UpdateSettingRequest { value })?)
            .await
    }
}
