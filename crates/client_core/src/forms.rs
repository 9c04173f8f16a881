//! Local validation for the client's forms. Every form validates before
//! anything is sent, and yields the request body on success.

use std::sync::LazyLock;

use regex::Regex;
use shared::protocol::{ContactMessage, CreateWorkerRequest, LoginRequest, RegisterRequest};

use crate::error::{ClientError, ClientResult};

pub const MIN_PASSWORD_LEN: usize = 8;

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
    });
    EMAIL_RE.is_match(email)
}

fn required(value: &str, label: &str) -> ClientResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ClientError::validation(format!("{label} is required")));
    }
    Ok(value.to_string())
}

fn email(value: &str) -> ClientResult<String> {
    let value = required(value, "email")?;
    if !is_valid_email(&value) {
        return Err(ClientError::validation(format!("invalid email '{value}'")));
    }
    Ok(value)
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> ClientResult<LoginRequest> {
        let email = email(&self.email)?;
        if self.password.is_empty() {
            return Err(ClientError::validation("password is required"));
        }
        Ok(LoginRequest {
            email,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// Carried over from an invitation link.
    pub invitation_token: Option<String>,
}

impl RegisterForm {
    pub fn validate(&self) -> ClientResult<RegisterRequest> {
        let first_name = required(&self.first_name, "first name")?;
        let last_name = required(&self.last_name, "last name")?;
        let email = email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.password != self.confirm_password {
            return Err(ClientError::validation("passwords do not match"));
        }
        Ok(RegisterRequest {
            first_name,
            last_name,
            email,
            password: self.password.clone(),
            invitation_token: optional(&self.invitation_token),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkerForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub rut: Option<String>,
    pub position: Option<String>,
}

impl WorkerForm {
    pub fn validate(&self) -> ClientResult<CreateWorkerRequest> {
        Ok(CreateWorkerRequest {
            first_name: required(&self.first_name, "first name")?,
            last_name: required(&self.last_name, "last name")?,
            email: email(&self.email)?,
            phone: optional(&self.phone),
            rut: optional(&self.rut),
            position: optional(&self.position),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> ClientResult<ContactMessage> {
        Ok(ContactMessage {
            name: required(&self.name, "name")?,
            email: email(&self.email)?,
            company: optional(&self.company),
            message: required(&self.message, "message")?,
        })
    }
}
