//! Helpers shared by the HTTP-level tests: a local axum server standing in
//! for the backend, and envelope builders.

use std::sync::{Arc, Mutex as StdMutex};

use axum::{http::HeaderMap, Json, Router};
use serde_json::{json, Value};
use shared::protocol::{ApiEnvelope, TokenPair};
use tokio::net::TcpListener;

use crate::{
    session::{MemoryTokenStore, SessionListener, TokenStore},
    transport::ApiService,
};

pub(crate) async fn spawn_api(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = Router::new().nest("/api", app);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/api")
}

pub(crate) fn ok(data: Value) -> Json<Value> {
    Json(json!(ApiEnvelope::ok(data)))
}

pub(crate) fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

pub(crate) fn tokens(access: &str, refresh: &str) -> TokenPair {
    TokenPair {
        access_token: access.to_string(),
        refresh_token: Some(refresh.to_string()),
    }
}

#[derive(Default)]
pub(crate) struct RecordingListener {
    pub(crate) redirects: StdMutex<Vec<String>>,
}

impl SessionListener for RecordingListener {
    fn session_expired(&self, login_path: &str) {
        self.redirects
            .lock()
            .expect("listener lock")
            .push(login_path.to_string());
    }
}

pub(crate) fn api_with_tokens(
    base_url: &str,
    pair: Option<TokenPair>,
) -> (Arc<ApiService>, Arc<MemoryTokenStore>, Arc<RecordingListener>) {
    let store = Arc::new(match pair {
        Some(pair) => MemoryTokenStore::with_tokens(pair),
        None => MemoryTokenStore::new(),
    });
    let listener = Arc::new(RecordingListener::default());
    let api = ApiService::new(
        base_url,
        Arc::clone(&store) as Arc<dyn TokenStore>,
        Arc::clone(&listener) as Arc<dyn SessionListener>,
    )
    .expect("api service");
    (Arc::new(api), store, listener)
}

pub(crate) fn worker_json(id: &str, first: &str, last: &str, email: &str) -> Value {
    json!({
        "id": id,
        "firstName": first,
        "lastName": last,
        "email": email,
        "createdAt": "2024-03-01T12:00:00Z"
    })
}
