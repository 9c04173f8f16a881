use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(CompanyId);
id_newtype!(WorkerId);
id_newtype!(ProcessId);
id_newtype!(InvitationId);
id_newtype!(ProcessInvitationId);
id_newtype!(WorkerProcessId);
id_newtype!(ReportId);
id_newtype!(AuditLogId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Company,
    Worker,
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Landing path for the role's dashboard.
    pub fn home_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Company => "/company",
            Role::Worker => "/worker",
            Role::Unknown => "/login",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl InvitationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvitationStatus::Pending => "PENDING",
            InvitationStatus::Accepted => "ACCEPTED",
            InvitationStatus::Expired => "EXPIRED",
            InvitationStatus::Cancelled => "CANCELLED",
            InvitationStatus::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerProcessStatus {
    Pending,
    InProgress,
    Approved,
    Rejected,
    Hired,
    #[serde(other)]
    Unknown,
}

impl WorkerProcessStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerProcessStatus::Pending => "PENDING",
            WorkerProcessStatus::InProgress => "IN_PROGRESS",
            WorkerProcessStatus::Approved => "APPROVED",
            WorkerProcessStatus::Rejected => "REJECTED",
            WorkerProcessStatus::Hired => "HIRED",
            WorkerProcessStatus::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Draft => "DRAFT",
            ReportStatus::PendingApproval => "PENDING_APPROVAL",
            ReportStatus::Approved => "APPROVED",
            ReportStatus::Rejected => "REJECTED",
            ReportStatus::Unknown => "UNKNOWN",
        }
    }
}
