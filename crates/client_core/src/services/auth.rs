use std::sync::Arc;

use shared::protocol::{AuthResponse, LoginRequest, RegisterRequest, User};
use tracing::{info, warn};

use crate::{
    error::ClientResult,
    transport::{ApiRequest, ApiService},
};

#[derive(Clone)]
pub struct AuthService {
    api: Arc<ApiService>,
}

impl AuthService {
    pub fn new(api: Arc<ApiService>) -> Self {
        Self { api }
    }

    /// Signs in and stores the returned token pair.
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<User> {
        let auth: AuthResponse = self
            .api
            .send(ApiRequest::post(&["auth", "login"]).json(request)?)
            .await?;
        self.api.tokens().store(auth.tokens())?;
        info!(email = %auth.user.email, role = ?auth.user.role, "signed in");
        Ok(auth.user)
    }

    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<User> {
        let auth: AuthResponse = self
            .api
            .send(ApiRequest::post(&["auth", "register"]).json(request)?)
            .await?;
        self.api.tokens().store(auth.tokens())?;
        info!(email = %auth.user.email, "registered");
        Ok(auth.user)
    }

    pub async fn me(&self) -> ClientResult<User> {
        self.api.send(ApiRequest::get(&["auth", "me"])).await
    }

    /// Local tokens are dropped even when the server call fails.
    pub async fn logout(&self) -> ClientResult<()> {
        if let Err(err) = self.api.send_empty(ApiRequest::post(&["auth", "logout"])).await {
            warn!("logout request failed: {err}");
        }
        self.api.tokens().clear()
    }
}
