//! One thin wrapper per backend resource, mapping operations to HTTP verbs
//! and paths. Caching and invalidation live one layer up in `queries`.

mod audit;
mod auth;
mod contact;
mod invitations;
mod process_invitations;
mod reports;
mod settings;
mod workers;

pub use audit::{AuditQuery, AuditService};
pub use auth::AuthService;
pub use contact::ContactService;
pub use invitations::{InvitationQuery, InvitationService};
pub use process_invitations::{ProcessInvitationQuery, ProcessInvitationService};
pub use reports::{ReportQuery, ReportService};
pub use settings::SettingsService;
pub use workers::{CvUpload, WorkerQuery, WorkerService};

#[cfg(test)]
#[path = "../tests/services_tests.rs"]
mod tests;
