//! Client core for the Talentree recruitment platform: an authenticated
//! REST transport, one service per backend resource, a memoizing query
//! cache, and the view models behind bulk invitee import and invitation
//! acceptance.

pub mod bulk_import;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod feedback;
pub mod forms;
pub mod invitation_flow;
pub mod queries;
pub mod query_cache;
pub mod services;
pub mod session;
pub mod transport;

pub use bulk_import::{BulkInviteModal, BulkInviteSender, BulkInviteSummary, ImportReport};
pub use config::{load_settings, Settings};
pub use error::{ClientError, ClientResult};
pub use feedback::{Toast, ToastLevel};
pub use invitation_flow::{AcceptOutcome, AcceptanceFlow, InvitationKind, InvitationPage};
pub use queries::Talentree;
pub use query_cache::{QueryCache, QueryKey};
pub use session::{FileTokenStore, MemoryTokenStore, SessionListener, TokenStore};
pub use transport::{ApiRequest, ApiService};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
