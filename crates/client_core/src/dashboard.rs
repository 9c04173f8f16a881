//! Per-role dashboard summaries, assembled from the cached reads.

use std::sync::Arc;

use shared::{
    domain::{InvitationStatus, ReportStatus, Role, WorkerProcessStatus},
    protocol::{AuditLog, User, WorkerProcess},
};
use tracing::debug;

use crate::{
    error::{ClientError, ClientResult},
    queries::Talentree,
    services::{AuditQuery, InvitationQuery, ReportQuery, WorkerQuery},
};

pub const RECENT_AUDIT_ENTRIES: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct AdminDashboard {
    pub recent_audit: Vec<AuditLog>,
    pub audit_total: u64,
    pub settings_count: usize,
    pub worker_total: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyDashboard {
    pub worker_total: u64,
    pub pending_invitations: usize,
    pub reports_by_status: Vec<(ReportStatus, usize)>,
}

impl CompanyDashboard {
    pub fn reports_awaiting_approval(&self) -> usize {
        count_of(&self.reports_by_status, ReportStatus::PendingApproval)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerDashboard {
    pub processes: Vec<WorkerProcess>,
    pub by_status: Vec<(WorkerProcessStatus, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dashboard {
    Admin(AdminDashboard),
    Company(CompanyDashboard),
    Worker(WorkerDashboard),
}

impl Dashboard {
    pub fn role(&self) -> Role {
        match self {
            Dashboard::Admin(_) => Role::Admin,
            Dashboard::Company(_) => Role::Company,
            Dashboard::Worker(_) => Role::Worker,
        }
    }

    pub fn home_path(&self) -> &'static str {
        self.role().home_path()
    }
}

/// Counts in order of first appearance.
pub fn count_by<S: Copy + Eq>(statuses: impl IntoIterator<Item = S>) -> Vec<(S, usize)> {
    let mut counts: Vec<(S, usize)> = Vec::new();
    for status in statuses {
        match counts.iter_mut().find(|(seen, _)| *seen == status) {
            Some((_, count)) => *count += 1,
            None => counts.push((status, 1)),
        }
    }
    counts
}

pub fn count_of<S: Copy + Eq>(counts: &[(S, usize)], status: S) -> usize {
    counts
        .iter()
        .find(|(seen, _)| *seen == status)
        .map_or(0, |(_, count)| *count)
}

pub async fn load_admin(talentree: &Talentree) -> ClientResult<AdminDashboard> {
    let audit_query = AuditQuery {
        limit: Some(RECENT_AUDIT_ENTRIES),
        ..AuditQuery::default()
    };
    let worker_query = WorkerQuery {
        limit: Some(1),
        ..WorkerQuery::default()
    };
    let (audit, settings, workers) = futures::try_join!(
        talentree.audit_logs(&audit_query),
        talentree.settings(),
        talentree.workers(&worker_query),
    )?;

    Ok(AdminDashboard {
        recent_audit: audit.items.clone(),
        audit_total: audit.total,
        settings_count: settings.len(),
        worker_total: workers.total,
    })
}

pub async fn load_company(talentree: &Talentree) -> ClientResult<CompanyDashboard> {
    let worker_query = WorkerQuery {
        limit: Some(1),
        ..WorkerQuery::default()
    };
    let pending = InvitationQuery {
        status: Some(InvitationStatus::Pending),
    };
    let report_query = ReportQuery::default();
    let (workers, invitations, reports) = futures::try_join!(
        talentree.workers(&worker_query),
        talentree.invitations(&pending),
        talentree.reports(&report_query),
    )?;

    Ok(CompanyDashboard {
        worker_total: workers.total,
        pending_invitations: invitations.len(),
        reports_by_status: count_by(reports.iter().map(|report| report.status)),
    })
}

pub async fn load_worker(talentree: &Talentree) -> ClientResult<WorkerDashboard> {
    let processes = talentree.my_processes().await?;
    Ok(WorkerDashboard {
        by_status: count_by(processes.iter().map(|process| process.status)),
        processes: processes.as_ref().clone(),
    })
}

pub async fn load_dashboard(talentree: &Talentree, role: Role) -> ClientResult<Dashboard> {
    debug!(?role, "loading dashboard");
    Ok(match role {
        Role::Admin => Dashboard::Admin(load_admin(talentree).await?),
        Role::Company => Dashboard::Company(load_company(talentree).await?),
        Role::Worker => Dashboard::Worker(load_worker(talentree).await?),
        Role::Unknown => {
            return Err(ClientError::Validation(
                "no dashboard for an unrecognized role".to_string(),
            ))
        }
    })
}

/// The signed-in user and the dashboard for their role.
pub async fn load_home(talentree: &Talentree) -> ClientResult<(Arc<User>, Dashboard)> {
    let user = talentree.current_user().await?;
    let dashboard = load_dashboard(talentree, user.role).await?;
    Ok((user, dashboard))
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
