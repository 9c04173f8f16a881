use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    bulk_import::{parse_sheet, read_sheet, BulkInviteModal},
    config::load_settings,
    dashboard::load_home,
    feedback::Toast,
    forms::{ContactForm, LoginForm, RegisterForm, WorkerForm},
    invitation_flow::{AcceptOutcome, AcceptanceFlow, InvitationKind, InvitationPage},
    services::{
        AuditQuery, CvUpload, InvitationQuery, ProcessInvitationQuery, ReportQuery, WorkerQuery,
    },
    session::{FileTokenStore, LoggingSessionListener, SessionListener, TokenStore},
    ClientError, Talentree,
};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{
        InvitationId, InvitationStatus, ProcessId, ProcessInvitationId, ReportId, ReportStatus,
        Role, WorkerId,
    },
    protocol::CreateInvitationRequest,
};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "talentree", about = "Talentree recruitment platform client")]
struct Cli {
    /// Overrides the configured API base URL.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    Register(RegisterArgs),
    #[command(subcommand)]
    Workers(WorkersCommand),
    #[command(subcommand)]
    Invitations(InvitationsCommand),
    #[command(subcommand)]
    ProcessInvitations(ProcessInvitationsCommand),
    /// Public invitation links.
    #[command(subcommand)]
    Invite(InviteCommand),
    #[command(subcommand)]
    Reports(ReportsCommand),
    #[command(subcommand)]
    Settings(SettingsCommand),
    Audit {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        action: Option<String>,
        #[arg(long)]
        entity: Option<String>,
    },
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        message: String,
    },
    Dashboard,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    confirm_password: String,
    #[arg(long)]
    invitation_token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum WorkersCommand {
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        search: Option<String>,
    },
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        rut: Option<String>,
        #[arg(long)]
        position: Option<String>,
    },
    Delete {
        id: WorkerId,
    },
    UploadCv {
        id: WorkerId,
        path: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum InvitationsCommand {
    List {
        #[arg(long, value_parser = enum_arg::<InvitationStatus>)]
        status: Option<InvitationStatus>,
    },
    Create {
        #[arg(long)]
        email: String,
        #[arg(long, value_parser = enum_arg::<Role>)]
        role: Option<Role>,
    },
    Cancel {
        id: InvitationId,
    },
}

#[derive(Subcommand, Debug)]
enum ProcessInvitationsCommand {
    List {
        #[arg(long)]
        process_id: Option<ProcessId>,
        #[arg(long, value_parser = enum_arg::<InvitationStatus>)]
        status: Option<InvitationStatus>,
    },
    /// Preview the invitees a spreadsheet would produce.
    Import { file: PathBuf },
    /// Invite every valid row of a spreadsheet to a process.
    Bulk {
        #[arg(long)]
        process_id: ProcessId,
        file: PathBuf,
    },
    Cancel {
        id: ProcessInvitationId,
    },
}

#[derive(Subcommand, Debug)]
enum InviteCommand {
    Show {
        token: String,
        /// The token belongs to a process invitation.
        #[arg(long)]
        process: bool,
    },
    Accept {
        token: String,
        #[arg(long)]
        process: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ReportsCommand {
    List {
        #[arg(long, value_parser = enum_arg::<ReportStatus>)]
        status: Option<ReportStatus>,
    },
    Approve {
        id: ReportId,
    },
    Reject {
        id: ReportId,
        #[arg(long)]
        reason: String,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    List,
    /// VALUE is parsed as JSON, falling back to a plain string.
    Set { key: String, value: String },
}

/// Parses a SCREAMING_SNAKE_CASE wire enum from any casing.
fn enum_arg<T: DeserializeOwned + Serialize>(raw: &str) -> Result<T, String> {
    let wire = raw.trim().replace('-', "_").to_ascii_uppercase();
    let parsed: T = serde_json::from_value(serde_json::Value::String(wire.clone()))
        .map_err(|err| err.to_string())?;
    match serde_json::to_value(&parsed) {
        Ok(serde_json::Value::String(back)) if back == wire && back != "UNKNOWN" => Ok(parsed),
        _ => Err(format!("unknown value '{raw}'")),
    }
}

fn session_path(configured: Option<PathBuf>) -> PathBuf {
    configured.unwrap_or_else(|| {
        dirs::config_dir()
            .map(|dir| dir.join("talentree").join("session.json"))
            .unwrap_or_else(|| PathBuf::from(".talentree").join("session.json"))
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn require_session(talentree: &Talentree) -> Result<()> {
    if !talentree.has_session() {
        bail!("not signed in; run `talentree login` first");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(api_url) = cli.api_url.clone() {
        settings.api_url = client_core::config::normalize_api_url(&api_url);
    }
    let store = FileTokenStore::open(session_path(settings.session_file.clone()));
    let talentree = Talentree::from_settings(
        &settings,
        Arc::new(store) as Arc<dyn TokenStore>,
        Arc::new(LoggingSessionListener) as Arc<dyn SessionListener>,
    )?;

    match run(&talentree, cli.json, cli.command).await {
        Err(err) => match err.downcast_ref::<ClientError>() {
            Some(ClientError::SessionExpired) => {
                bail!("session expired; run `talentree login` again")
            }
            Some(client_err) => bail!("{}", Toast::from_error(client_err, "request failed").message),
            None => Err(err),
        },
        ok => ok,
    }
}

async fn run(talentree: &Talentree, json: bool, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let request = LoginForm { email, password }.validate()?;
            let user = talentree.login(&request).await?;
            println!("signed in as {} ({:?})", user.email, user.role);
        }
        Command::Logout => {
            talentree.logout().await?;
            println!("signed out");
        }
        Command::Whoami => {
            require_session(talentree)?;
            let user = talentree.current_user().await?;
            if json {
                return print_json(user.as_ref());
            }
            println!("{}", render::user_line(&user));
        }
        Command::Register(args) => {
            let request = RegisterForm {
                first_name: args.first_name,
                last_name: args.last_name,
                email: args.email,
                password: args.password,
                confirm_password: args.confirm_password,
                invitation_token: args.invitation_token,
            }
            .validate()?;
            let user = talentree.register(&request).await?;
            println!("registered {}; home is {}", user.email, user.role.home_path());
        }
        Command::Workers(command) => workers(talentree, json, command).await?,
        Command::Invitations(command) => invitations(talentree, json, command).await?,
        Command::ProcessInvitations(command) => {
            process_invitations(talentree, json, command).await?
        }
        Command::Invite(command) => invite(talentree, json, command).await?,
        Command::Reports(command) => reports(talentree, json, command).await?,
        Command::Settings(command) => settings(talentree, json, command).await?,
        Command::Audit {
            page,
            limit,
            action,
            entity,
        } => {
            let query = AuditQuery {
                page,
                limit,
                action,
                entity,
                ..AuditQuery::default()
            };
            let logs = talentree.audit_logs(&query).await?;
            if json {
                return print_json(logs.as_ref());
            }
            for entry in &logs.items {
                println!("{}", render::audit_line(entry));
            }
            println!("page {} of {} entries", logs.page, logs.total);
        }
        Command::Contact {
            name,
            email,
            company,
            message,
        } => {
            let message = ContactForm {
                name,
                email,
                company,
                message,
            }
            .validate()?;
            talentree.send_contact(&message).await?;
            println!("{}", Toast::success("Message sent"));
        }
        Command::Dashboard => {
            require_session(talentree)?;
            let (user, dashboard) = load_home(talentree).await?;
            println!("{}", render::user_line(&user));
            for line in render::dashboard_lines(&dashboard) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

async fn workers(talentree: &Talentree, json: bool, command: WorkersCommand) -> Result<()> {
    match command {
        WorkersCommand::List {
            page,
            limit,
            search,
        } => {
            let workers = talentree
                .workers(&WorkerQuery {
                    page,
                    limit,
                    search,
                })
                .await?;
            if json {
                return print_json(workers.as_ref());
            }
            for worker in &workers.items {
                println!("{}", render::worker_line(worker));
            }
            println!("{} workers", workers.total);
        }
        WorkersCommand::Create {
            first_name,
            last_name,
            email,
            phone,
            rut,
            position,
        } => {
            let request = WorkerForm {
                first_name,
                last_name,
                email,
                phone,
                rut,
                position,
            }
            .validate()?;
            let worker = talentree.create_worker(&request).await?;
            println!("created worker_id={}", worker.id);
        }
        WorkersCommand::Delete { id } => {
            talentree.delete_worker(id).await?;
            println!("deleted worker_id={id}");
        }
        WorkersCommand::UploadCv { id, path } => {
            let upload = CvUpload::from_path(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let worker = talentree.upload_worker_cv(id, upload).await?;
            println!(
                "uploaded CV for worker_id={} ({})",
                worker.id,
                worker.cv_url.as_deref().unwrap_or("no url returned")
            );
        }
    }
    Ok(())
}

async fn invitations(talentree: &Talentree, json: bool, command: InvitationsCommand) -> Result<()> {
    match command {
        InvitationsCommand::List { status } => {
            let invitations = talentree.invitations(&InvitationQuery { status }).await?;
            if json {
                return print_json(invitations.as_ref());
            }
            for invitation in invitations.iter() {
                println!("{}", render::invitation_line(invitation));
            }
        }
        InvitationsCommand::Create { email, role } => {
            let email = email.trim().to_string();
            if !client_core::forms::is_valid_email(&email) {
                bail!("invalid email '{email}'");
            }
            let invitation = talentree
                .create_invitation(&CreateInvitationRequest { email, role })
                .await?;
            println!("invited {} (invitation_id={})", invitation.email, invitation.id);
        }
        InvitationsCommand::Cancel { id } => {
            let invitation = talentree.cancel_invitation(id).await?;
            println!("invitation_id={} is {}", invitation.id, invitation.status.as_str());
        }
    }
    Ok(())
}

async fn process_invitations(
    talentree: &Talentree,
    json: bool,
    command: ProcessInvitationsCommand,
) -> Result<()> {
    match command {
        ProcessInvitationsCommand::List { process_id, status } => {
            let invitations = talentree
                .process_invitations(&ProcessInvitationQuery { process_id, status })
                .await?;
            if json {
                return print_json(invitations.as_ref());
            }
            for invitation in invitations.iter() {
                println!("{}", render::process_invitation_line(invitation));
            }
        }
        ProcessInvitationsCommand::Import { file } => {
            let report = parse_sheet(&read_sheet(&file)?);
            if json {
                return print_json(&report.invitees);
            }
            for invitee in &report.invitees {
                println!("{}", render::invitee_line(invitee));
            }
            if let Some(message) = report.error_message() {
                eprintln!("{message}");
            }
            println!("{} valid invitees", report.invitees.len());
        }
        ProcessInvitationsCommand::Bulk { process_id, file } => {
            let mut modal = BulkInviteModal::new(process_id);
            modal.load_file(&file)?;
            if let Some(message) = modal.error() {
                eprintln!("{message}");
            }
            if !modal.can_submit() {
                bail!("nothing to send");
            }
            let summary = modal.submit(talentree).await?;
            if json {
                return print_json(&summary.errors);
            }
            println!("{}", Toast::for_bulk_invite(&summary));
            for failure in &summary.errors {
                println!("  {}: {}", failure.email, failure.message);
            }
        }
        ProcessInvitationsCommand::Cancel { id } => {
            let invitation = talentree.cancel_process_invitation(id).await?;
            println!("process_invitation_id={} is {}", invitation.id, invitation.status.as_str());
        }
    }
    Ok(())
}

async fn invite(talentree: &Talentree, json: bool, command: InviteCommand) -> Result<()> {
    let (token, process, accept) = match command {
        InviteCommand::Show { token, process } => (token, process, false),
        InviteCommand::Accept { token, process } => (token, process, true),
    };
    let kind = if process {
        InvitationKind::Process
    } else {
        InvitationKind::Company
    };
    let flow = AcceptanceFlow::new(talentree, kind);
    let page = flow.load(&token).await;

    if let InvitationPage::Loaded { invitation, .. } = &page {
        if json && !accept {
            return print_json(&render::invitation_details_json(invitation));
        }
        println!("{}", render::invitation_details_line(invitation));
    }
    println!("{}", page.message());
    if !accept {
        return Ok(());
    }

    match flow.accept(&page, talentree.has_session()).await? {
        AcceptOutcome::Login { path } => {
            println!("sign in to accept: run `talentree login`, then accept again ({path})");
        }
        AcceptOutcome::Navigate { path } => {
            println!("{}", Toast::success(format!("Invitation accepted; continue at {path}")));
        }
    }
    Ok(())
}

async fn reports(talentree: &Talentree, json: bool, command: ReportsCommand) -> Result<()> {
    match command {
        ReportsCommand::List { status } => {
            let reports = talentree
                .reports(&ReportQuery {
                    status,
                    ..ReportQuery::default()
                })
                .await?;
            if json {
                return print_json(reports.as_ref());
            }
            for report in reports.iter() {
                println!("{}", render::report_line(report));
            }
        }
        ReportsCommand::Approve { id } => {
            let report = talentree.approve_report(id).await?;
            println!("report_id={} is {}", report.id, report.status.as_str());
        }
        ReportsCommand::Reject { id, reason } => {
            if reason.trim().is_empty() {
                bail!("a rejection reason is required");
            }
            let report = talentree.reject_report(id, &reason).await?;
            println!("report_id={} is {}", report.id, report.status.as_str());
        }
    }
    Ok(())
}

async fn settings(talentree: &Talentree, json: bool, command: SettingsCommand) -> Result<()> {
    match command {
        SettingsCommand::List => {
            let settings = talentree.settings().await?;
            if json {
                return print_json(settings.as_ref());
            }
            for setting in settings.iter() {
                println!("{} = {}", setting.key, setting.value);
            }
        }
        SettingsCommand::Set { key, value } => {
            let value = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
            let setting = talentree.update_setting(&key, value).await?;
            println!("{} = {}", setting.key, setting.value);
        }
    }
    Ok(())
}
