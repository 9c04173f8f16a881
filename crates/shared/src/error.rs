use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `message` as the backend sends it: a single string, or one entry per
/// failed validation constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    Single(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    pub fn joined(&self) -> String {
        match self {
            ErrorMessage::Single(message) => message.clone(),
            ErrorMessage::Many(messages) => messages.join("; "),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<ErrorMessage>,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// Best human-readable message in the body, if any.
    pub fn display_message(&self) -> Option<String> {
        self.message
            .as_ref()
            .map(ErrorMessage::joined)
            .filter(|message| !message.trim().is_empty())
            .or_else(|| self.error.clone())
    }
}

#[derive(Debug, Clone, Error)]
#[error("HTTP {status}: {message}")]
pub struct ApiException {
    pub status: u16,
    pub message: String,
}

impl ApiException {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}
