//! User-facing notices for the outcome of an action.

use std::fmt;

use crate::{bulk_import::BulkInviteSummary, error::ClientError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Auth,
    Transport,
    Validation,
    Server,
    Unknown,
}

impl ErrorCategory {
    pub fn of(error: &ClientError) -> Self {
        match error {
            ClientError::SessionExpired => ErrorCategory::Auth,
            ClientError::Api(api) if api.is_unauthorized() || api.status == 403 => {
                ErrorCategory::Auth
            }
            ClientError::Api(api) if api.status < 500 => ErrorCategory::Validation,
            ClientError::Api(_) | ClientError::Envelope { .. } => ErrorCategory::Server,
            ClientError::Transport(_) | ClientError::Url(_) => ErrorCategory::Transport,
            ClientError::Validation(_) | ClientError::Import(_) => ErrorCategory::Validation,
            _ => ErrorCategory::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }

    /// Uses the server's message when there is one, `fallback` otherwise.
    pub fn from_error(error: &ClientError, fallback: &str) -> Self {
        let message = match error {
            ClientError::Transport(_) => {
                format!("{fallback}: server unreachable; check the network and retry.")
            }
            ClientError::Decode(_) | ClientError::CacheType(_) | ClientError::Io(_) => {
                fallback.to_string()
            }
            other => {
                let message = other.display_message();
                if message.trim().is_empty() {
                    fallback.to_string()
                } else {
                    message
                }
            }
        };
        Self::error(message)
    }

    /// Success when every invitee went through, error when none did.
    pub fn for_bulk_invite(summary: &BulkInviteSummary) -> Self {
        let message = summary.message();
        match (summary.successful, summary.failed) {
            (_, 0) => Self::success(message),
            (0, _) => Self::error(message),
            _ => Self::info(message),
        }
    }

    pub fn from_result<T>(result: &Result<T, ClientError>, success: &str, fallback: &str) -> Self {
        match result {
            Ok(_) => Self::success(success),
            Err(err) => Self::from_error(err, fallback),
        }
    }
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            ToastLevel::Success => "ok",
            ToastLevel::Error => "error",
            ToastLevel::Info => "info",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{error::ApiException, protocol::BulkInviteFailure};

    #[test]
    fn server_message_wins_over_fallback() {
        let err = ClientError::from(ApiException::new(409, "Email already registered"));
        let toast = Toast::from_error(&err, "Could not create worker");

        assert_eq!(toast, Toast::error("Email already registered"));
        assert_eq!(ErrorCategory::of(&err), ErrorCategory::Validation);
    }

    #[test]
    fn empty_server_message_falls_back() {
        let err = ClientError::from(ApiException::new(500, " "));
        let toast = Toast::from_error(&err, "Could not load reports");

        assert_eq!(toast.message, "Could not load reports");
        assert_eq!(ErrorCategory::of(&err), ErrorCategory::Server);
    }

    #[test]
    fn session_expiry_is_an_auth_error() {
        assert_eq!(
            ErrorCategory::of(&ClientError::SessionExpired),
            ErrorCategory::Auth
        );
        assert_eq!(
            ErrorCategory::of(&ClientError::from(ApiException::new(401, "Invalid credentials"))),
            ErrorCategory::Auth
        );
        assert_eq!(
            ErrorCategory::of(&ClientError::validation("passwords do not match")),
            ErrorCategory::Validation
        );
    }

    #[test]
    fn bulk_summary_levels() {
        let all_sent = BulkInviteSummary {
            successful: 3,
            failed: 0,
            errors: Vec::new(),
        };
        let partial = BulkInviteSummary {
            successful: 2,
            failed: 1,
            errors: vec![BulkInviteFailure {
                email: "ana@x.com".to_string(),
                message: "already invited".to_string(),
            }],
        };
        let none_sent = BulkInviteSummary {
            successful: 0,
            failed: 2,
            errors: Vec::new(),
        };

        assert_eq!(Toast::for_bulk_invite(&all_sent).level, ToastLevel::Success);
        assert_eq!(Toast::for_bulk_invite(&partial).level, ToastLevel::Info);
        assert_eq!(
            Toast::for_bulk_invite(&partial).message,
            "2 invitations sent, 1 failed"
        );
        assert_eq!(Toast::for_bulk_invite(&none_sent).level, ToastLevel::Error);
    }

    #[test]
    fn result_toast_and_display() {
        let ok: Result<(), ClientError> = Ok(());
        let toast = Toast::from_result(&ok, "Settings saved", "Could not save settings");
        assert_eq!(toast.to_string(), "[ok] Settings saved");
    }
}
