//! One-line text renderings for terminal output.

use client_core::{dashboard::Dashboard, invitation_flow::InvitationDetails};
use serde_json::{json, Value};
use shared::protocol::{
    AuditLog, Invitation, Invitee, ProcessInvitation, Report, User, Worker,
};

pub fn user_line(user: &User) -> String {
    let name = match (&user.first_name, &user.last_name) {
        (Some(first), Some(last)) => format!("{first} {last} <{}>", user.email),
        _ => user.email.clone(),
    };
    format!("{name} role={:?} home={}", user.role, user.role.home_path())
}

pub fn worker_line(worker: &Worker) -> String {
    let mut line = format!("{}  {}  {}", worker.id, worker.full_name(), worker.email);
    if let Some(position) = &worker.position {
        line.push_str(&format!("  [{position}]"));
    }
    if worker.has_cv() {
        line.push_str("  cv");
    }
    if worker.has_linked_account() {
        line.push_str("  account");
    }
    line
}

pub fn invitation_line(invitation: &Invitation) -> String {
    format!(
        "{}  {}  {}  expires {}",
        invitation.id,
        invitation.email,
        invitation.status.as_str(),
        invitation.expires_at.format("%Y-%m-%d")
    )
}

pub fn process_invitation_line(invitation: &ProcessInvitation) -> String {
    let process = invitation
        .process
        .as_ref()
        .map(|process| process.name.clone())
        .unwrap_or_else(|| invitation.process_id.to_string());
    format!(
        "{}  {} {} <{}>  {}  {}",
        invitation.id,
        invitation.first_name,
        invitation.last_name,
        invitation.email,
        process,
        invitation.status.as_str()
    )
}

pub fn invitee_line(invitee: &Invitee) -> String {
    format!(
        "{} {} <{}>",
        invitee.first_name, invitee.last_name, invitee.email
    )
}

pub fn report_line(report: &Report) -> String {
    let mut line = format!("{}  {}  {}", report.id, report.title, report.status.as_str());
    if let Some(reason) = &report.rejection_reason {
        line.push_str(&format!("  ({reason})"));
    }
    line
}

pub fn audit_line(entry: &AuditLog) -> String {
    format!(
        "{}  {} {}{}  by {}",
        entry.created_at.format("%Y-%m-%d %H:%M"),
        entry.action,
        entry.entity,
        entry
            .entity_id
            .as_deref()
            .map(|id| format!(" {id}"))
            .unwrap_or_default(),
        entry.user_email.as_deref().unwrap_or("system")
    )
}

pub fn invitation_details_line(invitation: &InvitationDetails) -> String {
    format!(
        "{} for {}  status {}  expires {}",
        invitation.title.as_deref().unwrap_or("invitation"),
        invitation.email,
        invitation.status.as_str(),
        invitation.expires_at.format("%Y-%m-%d %H:%M")
    )
}

pub fn invitation_details_json(invitation: &InvitationDetails) -> Value {
    json!({
        "kind": format!("{:?}", invitation.kind),
        "email": invitation.email,
        "title": invitation.title,
        "processId": invitation.process_id,
        "status": invitation.status,
        "expiresAt": invitation.expires_at,
    })
}

pub fn dashboard_lines(dashboard: &Dashboard) -> Vec<String> {
    match dashboard {
        Dashboard::Admin(admin) => {
            let mut lines = vec![
                format!("workers: {}", admin.worker_total),
                format!("settings: {}", admin.settings_count),
                format!("audit entries: {}", admin.audit_total),
            ];
            lines.extend(admin.recent_audit.iter().map(|entry| format!("  {}", audit_line(entry))));
            lines
        }
        Dashboard::Company(company) => {
            let mut lines = vec![
                format!("workers: {}", company.worker_total),
                format!("pending invitations: {}", company.pending_invitations),
                format!(
                    "reports awaiting approval: {}",
                    company.reports_awaiting_approval()
                ),
            ];
            lines.extend(
                company
                    .reports_by_status
                    .iter()
                    .map(|(status, count)| format!("  {}: {count}", status.as_str())),
            );
            lines
        }
        Dashboard::Worker(worker) => {
            let mut lines = vec![format!("applications: {}", worker.processes.len())];
            lines.extend(
                worker
                    .by_status
                    .iter()
                    .map(|(status, count)| format!("  {}: {count}", status.as_str())),
            );
            lines
        }
    }
}
