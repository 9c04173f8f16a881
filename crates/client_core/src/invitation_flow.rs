//! Public invitation links: load an invitation by its token, decide what
//! can be done with it, and accept it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    domain::{InvitationStatus, ProcessId},
    protocol::{Invitation, ProcessInvitation},
};
use tracing::{info, warn};
use url::form_urlencoded;

use crate::{
    error::{ClientError, ClientResult},
    queries::Talentree,
    transport::LOGIN_PATH,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationKind {
    /// Join a company account.
    Company,
    /// Apply to a selection process.
    Process,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationState {
    Expired,
    Cancelled,
    AlreadyAccepted,
    Pending,
}

impl InvitationState {
    pub fn message(self) -> &'static str {
        match self {
            InvitationState::Expired => "This invitation has expired.",
            InvitationState::Cancelled => "This invitation was cancelled.",
            InvitationState::AlreadyAccepted => "This invitation has already been accepted.",
            InvitationState::Pending => "You have been invited.",
        }
    }
}

/// The client-side expiry check wins over a status the server has not
/// moved out of `PENDING` yet.
pub fn classify(
    status: InvitationStatus,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> InvitationState {
    match status {
        InvitationStatus::Accepted => InvitationState::AlreadyAccepted,
        InvitationStatus::Cancelled => InvitationState::Cancelled,
        InvitationStatus::Expired => InvitationState::Expired,
        _ if expires_at <= now => InvitationState::Expired,
        _ => InvitationState::Pending,
    }
}

/// What the acceptance page shows for either kind of invitation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvitationDetails {
    pub kind: InvitationKind,
    pub token: String,
    pub email: String,
    /// Company or process name, when the server includes it.
    pub title: Option<String>,
    pub process_id: Option<ProcessId>,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
}

impl From<&Invitation> for InvitationDetails {
    fn from(invitation: &Invitation) -> Self {
        Self {
            kind: InvitationKind::Company,
            token: invitation.token.clone(),
            email: invitation.email.clone(),
            title: invitation.company_name.clone(),
            process_id: None,
            status: invitation.status,
            expires_at: invitation.expires_at,
        }
    }
}

impl From<&ProcessInvitation> for InvitationDetails {
    fn from(invitation: &ProcessInvitation) -> Self {
        Self {
            kind: InvitationKind::Process,
            token: invitation.token.clone(),
            email: invitation.email.clone(),
            title: invitation.process.as_ref().map(|process| process.name.clone()),
            process_id: Some(invitation.process_id),
            status: invitation.status,
            expires_at: invitation.expires_at,
        }
    }
}

/// Result of a successful accept call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    Company,
    Process(ProcessId),
}

impl Accepted {
    pub fn path(self) -> String {
        match self {
            Accepted::Company => "/company".to_string(),
            Accepted::Process(process_id) => format!("/worker/processes/{process_id}"),
        }
    }
}

#[async_trait]
pub trait InvitationGateway: Send + Sync {
    async fn fetch_by_token(
        &self,
        kind: InvitationKind,
        token: &str,
    ) -> ClientResult<InvitationDetails>;

    async fn accept_by_token(&self, kind: InvitationKind, token: &str) -> ClientResult<Accepted>;
}

#[async_trait]
impl InvitationGateway for Talentree {
    async fn fetch_by_token(
        &self,
        kind: InvitationKind,
        token: &str,
    ) -> ClientResult<InvitationDetails> {
        match kind {
            InvitationKind::Company => {
                let invitation = self.invitation_by_token(token).await?;
                Ok(InvitationDetails::from(invitation.as_ref()))
            }
            InvitationKind::Process => {
                let invitation = self.process_invitation_by_token(token).await?;
                Ok(InvitationDetails::from(invitation.as_ref()))
            }
        }
    }

    async fn accept_by_token(&self, kind: InvitationKind, token: &str) -> ClientResult<Accepted> {
        match kind {
            InvitationKind::Company => {
                self.accept_invitation(token).await?;
                Ok(Accepted::Company)
            }
            InvitationKind::Process => {
                let worker_process = self.accept_process_invitation(token).await?;
                Ok(Accepted::Process(worker_process.process_id))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvitationPage {
    /// The token did not resolve to an invitation.
    Invalid { message: String },
    Loaded {
        invitation: InvitationDetails,
        state: InvitationState,
    },
}

impl InvitationPage {
    pub fn state(&self) -> Option<InvitationState> {
        match self {
            InvitationPage::Invalid { .. } => None,
            InvitationPage::Loaded { state, .. } => Some(*state),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            InvitationPage::Invalid { message } => message,
            InvitationPage::Loaded { state, .. } => state.message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// No session: sign in first, carrying the token along.
    Login { path: String },
    Navigate { path: String },
}

pub fn login_path(token: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("invitationToken", token)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}

pub struct AcceptanceFlow<'a> {
    gateway: &'a dyn InvitationGateway,
    kind: InvitationKind,
}

impl<'a> AcceptanceFlow<'a> {
    pub fn new(gateway: &'a dyn InvitationGateway, kind: InvitationKind) -> Self {
        Self { gateway, kind }
    }

    pub fn kind(&self) -> InvitationKind {
        self.kind
    }

    pub async fn load(&self, token: &str) -> InvitationPage {
        self.load_at(token, Utc::now()).await
    }

    pub async fn load_at(&self, token: &str, now: DateTime<Utc>) -> InvitationPage {
        let token = token.trim();
        if token.is_empty() {
            return InvitationPage::Invalid {
                message: "The invitation link is missing its token.".to_string(),
            };
        }

        match self.gateway.fetch_by_token(self.kind, token).await {
            Ok(invitation) => {
                let state = classify(invitation.status, invitation.expires_at, now);
                InvitationPage::Loaded { invitation, state }
            }
            Err(err) => {
                warn!(kind = ?self.kind, "invitation lookup failed: {err}");
                let message = if err.is_not_found() {
                    "This invitation does not exist.".to_string()
                } else {
                    err.display_message()
                };
                InvitationPage::Invalid { message }
            }
        }
    }

    /// Accepts a pending invitation, or sends the user to sign in when
    /// there is no session.
    pub async fn accept(
        &self,
        page: &InvitationPage,
        has_session: bool,
    ) -> ClientResult<AcceptOutcome> {
        let invitation = match page {
            InvitationPage::Loaded {
                invitation,
                state: InvitationState::Pending,
            } => invitation,
            other => return Err(ClientError::validation(other.message())),
        };

        if !has_session {
            return Ok(AcceptOutcome::Login {
                path: login_path(&invitation.token),
            });
        }

        let accepted = self
            .gateway
            .accept_by_token(invitation.kind, &invitation.token)
            .await?;
        info!(kind = ?invitation.kind, "invitation accepted");
        Ok(AcceptOutcome::Navigate {
            path: accepted.path(),
        })
    }
}

#[cfg(test)]
#[path = "tests/invitation_flow_tests.rs"]
mod tests;
