//! Cached data access over the resource services.
//!
//! Reads are memoized in the [`QueryCache`]; each successful mutation
//! invalidates the resources whose lists it changes. A failed mutation
//! leaves the cache alone.

use std::sync::Arc;

use shared::{
    domain::{InvitationId, ProcessInvitationId, ReportId, WorkerId},
    protocol::{
        AuditLog, BulkInviteResponse, BulkProcessInvitationRequest, ContactMessage,
        CreateInvitationRequest, CreateProcessInvitationRequest, CreateReportRequest,
        CreateWorkerRequest, Invitation, LoginRequest, Paginated, ProcessInvitation,
        RegisterRequest, RejectReportRequest, Report, Setting, UpdateReportRequest,
        UpdateWorkerRequest, User, Worker, WorkerProcess,
    },
};
use tracing::info;

use crate::{
    config::Settings,
    error::ClientResult,
    query_cache::{QueryCache, QueryKey},
    services::{
        AuditQuery, AuditService, AuthService, ContactService, CvUpload, InvitationQuery,
        InvitationService, ProcessInvitationQuery, ProcessInvitationService, ReportQuery,
        ReportService, SettingsService, WorkerQuery, WorkerService,
    },
    session::{SessionListener, TokenStore},
    transport::ApiService,
};

pub const CURRENT_USER: &str = "me";
pub const WORKERS: &str = "workers";
pub const WORKER_PROCESSES: &str = "worker-processes";
pub const INVITATIONS: &str = "invitations";
pub const PROCESS_INVITATIONS: &str = "process-invitations";
pub const REPORTS: &str = "reports";
pub const SETTINGS: &str = "settings";
pub const AUDIT: &str = "audit";

pub struct Talentree {
    api: Arc<ApiService>,
    cache: QueryCache,
    auth: AuthService,
    workers: WorkerService,
    invitations: InvitationService,
    process_invitations: ProcessInvitationService,
    reports: ReportService,
    settings: SettingsService,
    audit: AuditService,
    contact: ContactService,
}

impl Talentree {
    pub fn new(api: Arc<ApiService>, cache: QueryCache) -> Self {
        Self {
            auth: AuthService::new(Arc::clone(&api)),
            workers: WorkerService::new(Arc::clone(&api)),
            invitations: InvitationService::new(Arc::clone(&api)),
            process_invitations: ProcessInvitationService::new(Arc::clone(&api)),
            reports: ReportService::new(Arc::clone(&api)),
            settings: SettingsService::new(Arc::clone(&api)),
            audit: AuditService::new(Arc::clone(&api)),
            contact: ContactService::new(Arc::clone(&api)),
            api,
            cache,
        }
    }

    pub fn from_settings(
        settings: &Settings,
        tokens: Arc<dyn TokenStore>,
        listener: Arc<dyn SessionListener>,
    ) -> ClientResult<Self> {
        let api = ApiService::new(&settings.api_url, tokens, listener)?;
        Ok(Self::new(
            Arc::new(api),
            QueryCache::new(settings.cache_stale_time()),
        ))
    }

    pub fn api(&self) -> &Arc<ApiService> {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn has_session(&self) -> bool {
        self.api.has_session()
    }

    // Session

    pub async fn login(&self, request: &LoginRequest) -> ClientResult<User> {
        let user = self.auth.login(request).await?;
        self.cache.clear().await;
        Ok(user)
    }

    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<User> {
        let user = self.auth.register(request).await?;
        self.cache.clear().await;
        Ok(user)
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.cache.clear().await;
        self.auth.logout().await?;
        info!("signed out");
        Ok(())
    }

    pub async fn current_user(&self) -> ClientResult<Arc<User>> {
        self.cache
            .fetch(QueryKey::new(CURRENT_USER), || self.auth.me())
            .await
    }

    // Workers

    pub async fn workers(&self, query: &WorkerQuery) -> ClientResult<Arc<Paginated<Worker>>> {
        let key = QueryKey::with_params(WORKERS, query)?;
        self.cache.fetch(key, || self.workers.list(query)).await
    }

    pub async fn worker(&self, id: WorkerId) -> ClientResult<Arc<Worker>> {
        let key = QueryKey::with_params(WORKERS, &id)?;
        self.cache.fetch(key, || self.workers.get(id)).await
    }

    pub async fn create_worker(&self, request: &CreateWorkerRequest) -> ClientResult<Worker> {
        let worker = self.workers.create(request).await?;
        self.cache.invalidate(WORKERS).await;
        info!(worker_id = %worker.id, "worker created");
        Ok(worker)
    }

    pub async fn update_worker(
        &self,
        id: WorkerId,
        request: &UpdateWorkerRequest,
    ) -> ClientResult<Worker> {
        let worker = self.workers.update(id, request).await?;
        self.cache.invalidate(WORKERS).await;
        info!(worker_id = %id, "worker updated");
        Ok(worker)
    }

    pub async fn delete_worker(&self, id: WorkerId) -> ClientResult<()> {
        self.workers.delete(id).await?;
        self.cache.invalidate(WORKERS).await;
        info!(worker_id = %id, "worker deleted");
        Ok(())
    }

    pub async fn upload_worker_cv(&self, id: WorkerId, upload: CvUpload) -> ClientResult<Worker> {
        let worker = self.workers.upload_cv(id, upload).await?;
        self.cache.invalidate(WORKERS).await;
        info!(worker_id = %id, "worker CV uploaded");
        Ok(worker)
    }

    pub async fn my_processes(&self) -> ClientResult<Arc<Vec<WorkerProcess>>> {
        self.cache
            .fetch(QueryKey::new(WORKER_PROCESSES), || self.workers.my_processes())
            .await
    }

    // Company invitations

    pub async fn invitations(&self, query: &InvitationQuery) -> ClientResult<Arc<Vec<Invitation>>> {
        let key = QueryKey::with_params(INVITATIONS, query)?;
        self.cache.fetch(key, || self.invitations.list(query)).await
    }

    pub async fn create_invitation(
        &self,
        request: &CreateInvitationRequest,
    ) -> ClientResult<Invitation> {
        let invitation = self.invitations.create(request).await?;
        self.cache.invalidate(INVITATIONS).await;
        info!(invitation_id = %invitation.id, "invitation created");
        Ok(invitation)
    }

    pub async fn cancel_invitation(&self, id: InvitationId) -> ClientResult<Invitation> {
        let invitation = self.invitations.cancel(id).await?;
        self.cache.invalidate(INVITATIONS).await;
        info!(invitation_id = %id, "invitation cancelled");
        Ok(invitation)
    }

    pub async fn resend_invitation(&self, id: InvitationId) -> ClientResult<()> {
        self.invitations.resend(id).await?;
        self.cache.invalidate(INVITATIONS).await;
        Ok(())
    }

    pub async fn invitation_by_token(&self, token: &str) -> ClientResult<Arc<Invitation>> {
        let key = QueryKey::with_params(INVITATIONS, &("token", token))?;
        self.cache
            .fetch(key, || self.invitations.by_token(token))
            .await
    }

    pub async fn accept_invitation(&self, token: &str) -> ClientResult<Invitation> {
        let invitation = self.invitations.accept(token).await?;
        self.cache.invalidate_many(&[INVITATIONS, CURRENT_USER]).await;
        info!(invitation_id = %invitation.id, "invitation accepted");
        Ok(invitation)
    }

    // Process invitations

    pub async fn process_invitations(
        &self,
        query: &ProcessInvitationQuery,
    ) -> ClientResult<Arc<Vec<ProcessInvitation>>> {
        let key = QueryKey::with_params(PROCESS_INVITATIONS, query)?;
        self.cache
            .fetch(key, || self.process_invitations.list(query))
            .await
    }

    pub async fn create_process_invitation(
        &self,
        request: &CreateProcessInvitationRequest,
    ) -> ClientResult<ProcessInvitation> {
        let invitation = self.process_invitations.create(request).await?;
        self.cache.invalidate(PROCESS_INVITATIONS).await;
        info!(invitation_id = %invitation.id, "process invitation created");
        Ok(invitation)
    }

    pub async fn bulk_invite(
        &self,
        request: &BulkProcessInvitationRequest,
    ) -> ClientResult<BulkInviteResponse> {
        let response = self.process_invitations.bulk_create(request).await?;
        self.cache.invalidate(PROCESS_INVITATIONS).await;
        info!(
            process_id = %request.process_id,
            successful = response.successful,
            failed = response.failed,
            "bulk process invitations sent"
        );
        Ok(response)
    }

    pub async fn cancel_process_invitation(
        &self,
        id: ProcessInvitationId,
    ) -> ClientResult<ProcessInvitation> {
        let invitation = self.process_invitations.cancel(id).await?;
        self.cache.invalidate(PROCESS_INVITATIONS).await;
        Ok(invitation)
    }

    pub async fn resend_process_invitation(&self, id: ProcessInvitationId) -> ClientResult<()> {
        self.process_invitations.resend(id).await?;
        self.cache.invalidate(PROCESS_INVITATIONS).await;
        Ok(())
    }

    pub async fn process_invitation_by_token(
        &self,
        token: &str,
    ) -> ClientResult<Arc<ProcessInvitation>> {
        let key = QueryKey::with_params(PROCESS_INVITATIONS, &("token", token))?;
        self.cache
            .fetch(key, || self.process_invitations.by_token(token))
            .await
    }

    pub async fn accept_process_invitation(&self, token: &str) -> ClientResult<WorkerProcess> {
        let worker_process = self.process_invitations.accept(token).await?;
        self.cache
            .invalidate_many(&[PROCESS_INVITATIONS, WORKER_PROCESSES])
            .await;
        info!(process_id = %worker_process.process_id, "process invitation accepted");
        Ok(worker_process)
    }

    // Reports

    pub async fn reports(&self, query: &ReportQuery) -> ClientResult<Arc<Vec<Report>>> {
        let key = QueryKey::with_params(REPORTS, query)?;
        self.cache.fetch(key, || self.reports.list(query)).await
    }

    pub async fn report(&self, id: ReportId) -> ClientResult<Arc<Report>> {
        let key = QueryKey::with_params(REPORTS, &id)?;
        self.cache.fetch(key, || self.reports.get(id)).await
    }

    pub async fn create_report(&self, request: &CreateReportRequest) -> ClientResult<Report> {
        let report = self.reports.create(request).await?;
        self.cache.invalidate(REPORTS).await;
        info!(report_id = %report.id, "report created");
        Ok(report)
    }

    pub async fn update_report(
        &self,
        id: ReportId,
        request: &UpdateReportRequest,
    ) -> ClientResult<Report> {
        let report = self.reports.update(id, request).await?;
        self.cache.invalidate(REPORTS).await;
        Ok(report)
    }

    pub async fn delete_report(&self, id: ReportId) -> ClientResult<()> {
        self.reports.delete(id).await?;
        self.cache.invalidate(REPORTS).await;
        Ok(())
    }

    pub async fn submit_report(&self, id: ReportId) -> ClientResult<Report> {
        let report = self.reports.submit(id).await?;
        self.cache.invalidate(REPORTS).await;
        info!(report_id = %id, status = report.status.as_str(), "report submitted");
        Ok(report)
    }

    pub async fn approve_report(&self, id: ReportId) -> ClientResult<Report> {
        let report = self.reports.approve(id).await?;
        self.cache.invalidate(REPORTS).await;
        info!(report_id = %id, status = report.status.as_str(), "report approved");
        Ok(report)
    }

    pub async fn reject_report(&self, id: ReportId, reason: &str) -> ClientResult<Report> {
        let request = RejectReportRequest {
            reason: reason.trim().to_string(),
        };
        let report = self.reports.reject(id, &request).await?;
        self.cache.invalidate(REPORTS).await;
        info!(report_id = %id, status = report.status.as_str(), "report rejected");
        Ok(report)
    }

    // Settings

    pub async fn settings(&self) -> ClientResult<Arc<Vec<Setting>>> {
        self.cache
            .fetch(QueryKey::new(SETTINGS), || self.settings.list())
            .await
    }

    pub async fn setting(&self, key: &str) -> ClientResult<Arc<Setting>> {
        let query_key = QueryKey::with_params(SETTINGS, &key)?;
        self.cache
            .fetch(query_key, || self.settings.get(key))
            .await
    }

    pub async fn update_setting(&self, key: &str, value: serde_json::Value) -> ClientResult<Setting> {
        let setting = self.settings.update(key, value).await?;
        self.cache.invalidate(SETTINGS).await;
        info!(key, "setting updated");
        Ok(setting)
    }

    // Audit and contact

    pub async fn audit_logs(&self, query: &AuditQuery) -> ClientResult<Arc<Paginated<AuditLog>>> {
        let key = QueryKey::with_params(AUDIT, query)?;
        self.cache.fetch(key, || self.audit.list(query)).await
    }

    pub async fn send_contact(&self, message: &ContactMessage) -> ClientResult<()> {
        self.contact.send(message).await
    }
}

#[cfg(test)]
#[path = "tests/queries_tests.rs"]
mod tests;
