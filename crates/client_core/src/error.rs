use shared::error::ApiException;
use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Api(#[from] ApiException),
    #[error("session expired; sign in again")]
    SessionExpired,
    #[error("unsuccessful response: {message}")]
    Envelope { message: String },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Validation(String),
    #[error("import failed: {0}")]
    Import(String),
    #[error("cached value for {0} has an unexpected type")]
    CacheType(String),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Message suitable for a toast: the server's own `message` when it
    /// sent one, otherwise the error's display text.
    pub fn display_message(&self) -> String {
        match self {
            ClientError::Api(api) => api.message.clone(),
            ClientError::Envelope { message } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api(api) => Some(api.status),
            ClientError::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
