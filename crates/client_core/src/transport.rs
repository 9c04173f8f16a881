//! Shared HTTP client for the Talentree REST API.
//!
//! Every response body is wrapped in [`ApiEnvelope`]. A 401 on a
//! non-auth endpoint triggers a single refresh through `/auth/refresh`
//! followed by one retry of the original request; if that fails the
//! stored tokens are dropped and the [`SessionListener`] is told to send
//! the user back to `/login`.

use std::sync::Arc;

use reqwest::{
    multipart::{Form, Part},
    Client, Method, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    error::{ApiErrorBody, ApiException},
    protocol::{ApiEnvelope, RefreshRequest, TokenPair},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::{ClientError, ClientResult},
    session::{SessionListener, TokenStore},
};

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone)]
enum RequestBody {
    Empty,
    Json(serde_json::Value),
    File {
        field: String,
        filename: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    },
}

/// A request that can be replayed after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(segments: &[&str]) -> Self {
        Self::new(Method::GET, segments)
    }

    pub fn post(segments: &[&str]) -> Self {
        Self::new(Method::POST, segments)
    }

    pub fn put(segments: &[&str]) -> Self {
        Self::new(Method::PUT, segments)
    }

    pub fn patch(segments: &[&str]) -> Self {
        Self::new(Method::PATCH, segments)
    }

    pub fn delete(segments: &[&str]) -> Self {
        Self::new(Method::DELETE, segments)
    }

    /// Flattens a serializable struct into query pairs; `None` fields are
    /// omitted.
    pub fn query<Q: Serialize>(mut self, params: &Q) -> ClientResult<Self> {
        self.query = query_pairs(params)?;
        Ok(self)
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> ClientResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn file(
        mut self,
        field: impl Into<String>,
        filename: impl Into<String>,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.body = RequestBody::File {
            field: field.into(),
            filename: filename.into(),
            mime_type,
            bytes,
        };
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    fn is_auth_endpoint(&self) -> bool {
        self.segments.first().is_some_and(|segment| segment == "auth")
    }
}

pub(crate) fn query_pairs<Q: Serialize>(params: &Q) -> ClientResult<Vec<(String, String)>> {
    let value = serde_json::to_value(params)?;
    let serde_json::Value::Object(map) = value else {
        return Err(ClientError::validation("query parameters must be a struct"));
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            serde_json::Value::Null => {}
            serde_json::Value::String(s) => pairs.push((key, s)),
            other => pairs.push((key, other.to_string())),
        }
    }
    Ok(pairs)
}

pub struct ApiService {
    http: Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
    listener: Arc<dyn SessionListener>,
    refresh_lock: Mutex<()>,
}

impl ApiService {
    pub fn new(
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
        listener: Arc<dyn SessionListener>,
    ) -> ClientResult<Self> {
        Self::with_client(Client::new(), base_url, tokens, listener)
    }

    pub fn with_client(
        http: Client,
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
        listener: Arc<dyn SessionListener>,
    ) -> ClientResult<Self> {
        let base_url = Url::parse(base_url.trim().trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::validation(format!(
                "api url '{base_url}' cannot be used as a base url"
            )));
        }
        Ok(Self {
            http,
            base_url,
            tokens,
            listener,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn has_session(&self) -> bool {
        self.tokens.has_session()
    }

    /// Sends the request and unwraps `data` from the envelope.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let response = self.execute(&request).await?;
        let bytes = response.bytes().await?;
        let envelope: ApiEnvelope<T> = serde_json::from_slice(&bytes)?;
        if !envelope.success {
            return Err(unsuccessful(envelope.message.map(|m| m.joined())));
        }
        envelope.data.ok_or_else(|| ClientError::Envelope {
            message: format!("{} returned no data", request.path()),
        })
    }

    /// Sends a request whose response carries no data worth decoding.
    pub async fn send_empty(&self, request: ApiRequest) -> ClientResult<()> {
        let response = self.execute(&request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_slice(&bytes)?;
        if !envelope.success {
            return Err(unsuccessful(envelope.message.map(|m| m.joined())));
        }
        Ok(())
    }

    async fn execute(&self, request: &ApiRequest) -> ClientResult<Response> {
        let token = self.tokens.access_token();
        let response = self.dispatch(request, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED || request.is_auth_endpoint() {
            return check_status(response).await;
        }

        debug!(path = %request.path(), "unauthorized; refreshing session once");
        let refreshed = self.refresh_after_unauthorized(token.as_deref()).await?;
        let retried = self.dispatch(request, Some(&refreshed)).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!(path = %request.path(), "still unauthorized after refresh");
            self.expire_session();
            return Err(ClientError::SessionExpired);
        }
        check_status(retried).await
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> ClientResult<Response> {
        let url = self.url_for(&request.segments)?;
        debug!(method = %request.method, %url, "api request");

        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::File {
                field,
                filename,
                mime_type,
                bytes,
            } => {
                let mut part = Part::bytes(bytes.clone()).file_name(filename.clone());
                if let Some(mime_type) = mime_type {
                    part = part.mime_str(mime_type)?;
                }
                builder.multipart(Form::new().part(field.clone(), part))
            }
        };

        Ok(builder.send().await?)
    }

    fn url_for(&self, segments: &[String]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ClientError::validation("api url cannot carry a path"))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn refresh_after_unauthorized(&self, stale_token: Option<&str>) -> ClientResult<String> {
        let _guard = self.refresh_lock.lock().await;

        // Another request may have refreshed while this one waited.
        if let Some(current) = self.tokens.access_token() {
            if Some(current.as_str()) != stale_token {
                return Ok(current);
            }
        }

        let Some(refresh_token) = self.tokens.refresh_token() else {
            // A refresh that failed while this request waited already expired
            // the session and notified the listener.
            if stale_token.is_none() || self.tokens.access_token().is_some() {
                self.expire_session();
            }
            return Err(ClientError::SessionExpired);
        };

        match self.request_refresh(&refresh_token).await {
            Ok(mut pair) => {
                if pair.refresh_token.is_none() {
                    pair.refresh_token = Some(refresh_token);
                }
                let access_token = pair.access_token.clone();
                self.tokens.store(pair)?;
                info!("session refreshed");
                Ok(access_token)
            }
            Err(err) => {
                warn!("session refresh failed: {err}");
                self.expire_session();
                Err(ClientError::SessionExpired)
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> ClientResult<TokenPair> {
        let request = ApiRequest::post(&["auth", "refresh"]).json(&RefreshRequest {
            refresh_token: refresh_token.to_string(),
        })?;
        let response = check_status(self.dispatch(&request, None).await?).await?;
        let envelope: ApiEnvelope<TokenPair> = response.json().await?;
        if !envelope.success {
            return Err(unsuccessful(envelope.message.map(|m| m.joined())));
        }
        envelope.data.ok_or_else(|| ClientError::Envelope {
            message: "refresh returned no tokens".to_string(),
        })
    }

    fn expire_session(&self) {
        if let Err(err) = self.tokens.clear() {
            warn!("failed to clear stored tokens: {err}");
        }
        self.listener.session_expired(LOGIN_PATH);
    }
}

fn unsuccessful(message: Option<String>) -> ClientError {
    ClientError::Envelope {
        message: message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "request was not successful".to_string()),
    }
}

async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message_from_body(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    Err(ApiException::new(status.as_u16(), message).into())
}

/// Pulls `message` (string or array) out of an error body, whether it is
/// a bare error object or wrapped in the envelope.
pub(crate) fn error_message_from_body(body: &str) -> Option<String> {
    if let Ok(envelope) = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body) {
        if let Some(message) = envelope.message.map(|m| m.joined()) {
            if !message.trim().is_empty() {
                return Some(message);
            }
        }
    }
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|body| body.display_message())
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
