//! Taskboard - command-line client
//!
//! Talks to the taskboard backend with the access token issued by the hosted
//! identity provider. `watch` keeps a live board open: it polls, listens on
//! the realtime socket and redraws on every change.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use taskboard::api::{ApiClient, NewTask, Task, TaskPatch, TaskPriority, TaskStatus, TaskboardApi};
use taskboard::auth::{AuthSession, StaticTokenProvider};
use taskboard::board::{columns, DropOutcome, DueFilter, TaskFilter};
use taskboard::dashboard::{self, DashboardStats};
use taskboard::realtime::RealtimeChannel;
use taskboard::sync::ProjectView;
use taskboard::task_detail::{is_image_file, TaskDetail};
use taskboard::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Taskboard command-line client")]
struct Cli {
    /// Path to the YAML config file (default: ./taskboard.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend API URL (overrides config)
    #[arg(long, global = true, env = "TASKBOARD_API_URL")]
    api_url: Option<String>,

    /// Access token (overrides config)
    #[arg(long, global = true, env = "TASKBOARD_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Workspace operations
    Workspace {
        #[command(subcommand)]
        action: WorkspaceAction,
    },

    /// Project operations
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Task operations
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Comment operations
    Comment {
        #[command(subcommand)]
        action: CommentAction,
    },

    /// Attachment operations
    Attachment {
        #[command(subcommand)]
        action: AttachmentAction,
    },

    /// Recent activity across all projects, newest first
    Activity {
        /// Max entries
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Task statistics across all projects
    Dashboard,

    /// Keep a live board open until Ctrl-C
    Watch {
        /// Project ID
        project: String,
    },

    /// Print the hosted sign-in and sign-out URLs
    LoginUrl,
}

#[derive(Subcommand)]
enum WorkspaceAction {
    /// List workspaces
    List,

    /// Create a workspace
    Create {
        /// Workspace name
        name: String,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// List projects of a workspace
    List {
        /// Workspace ID
        workspace: String,
    },

    /// Create a project
    Create {
        /// Workspace ID
        workspace: String,

        /// Project name
        name: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DueArg {
    All,
    Today,
    Overdue,
}

impl From<DueArg> for DueFilter {
    fn from(arg: DueArg) -> Self {
        match arg {
            DueArg::All => DueFilter::All,
            DueArg::Today => DueFilter::Today,
            DueArg::Overdue => DueFilter::Overdue,
        }
    }
}

#[derive(Subcommand)]
enum TaskAction {
    /// Show a project's board
    List {
        /// Project ID
        project: String,

        /// Title substring
        #[arg(short, long)]
        search: Option<String>,

        /// Only this status (todo, in_progress, done)
        #[arg(long)]
        status: Option<TaskStatus>,

        /// Only this priority (low, medium, high, urgent)
        #[arg(long)]
        priority: Option<TaskPriority>,

        /// Due-date filter
        #[arg(long, value_enum, default_value = "all")]
        due: DueArg,
    },

    /// Create a task in the todo column
    Create {
        /// Project ID
        project: String,

        /// Task title
        title: String,
    },

    /// Move a task to another column
    Move {
        /// Project ID
        project: String,

        /// Task ID
        task: String,

        /// Target status (todo, in_progress, done)
        status: TaskStatus,
    },

    /// Edit task fields
    Update {
        /// Project ID
        project: String,

        /// Task ID
        task: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        priority: Option<TaskPriority>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },

    /// Show comments, activity and attachments of a task
    Show {
        /// Task ID
        id: String,
    },
}

#[derive(Subcommand)]
enum CommentAction {
    /// Comment on a task
    Add {
        /// Task ID
        task: String,

        /// Comment text
        message: String,
    },
}

#[derive(Subcommand)]
enum AttachmentAction {
    /// List attachments of a task
    List {
        /// Task ID
        task: String,
    },

    /// Upload a file to a task
    Upload {
        /// Task ID
        task: String,

        /// File to upload
        path: PathBuf,
    },

    /// Print a signed download URL
    DownloadUrl {
        /// Attachment ID
        id: String,
    },

    /// Delete an attachment
    Delete {
        /// Task ID
        task: String,

        /// Attachment ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,taskboard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if cli.token.is_some() {
        config.access_token = cli.token;
    }

    if let Commands::LoginUrl = cli.command {
        return print_login_urls(&config);
    }

    let tokens = Arc::new(StaticTokenProvider::new(config.access_token.clone()));
    let session = AuthSession::new();
    session.load(tokens.as_ref()).await;
    if session.require().is_err() {
        if config.hosted_ui.is_configured() {
            eprintln!("Not signed in. Sign in at:\n  {}", config.hosted_ui.login_url());
        }
        bail!("No access token; set TASKBOARD_ACCESS_TOKEN or pass --token");
    }

    let client = ApiClient::with_timeout(&config.api_url, tokens, config.api_timeout)?;
    let api: Arc<dyn TaskboardApi> = Arc::new(client);

    match cli.command {
        Commands::Workspace { action } => handle_workspace(api.as_ref(), action).await,
        Commands::Project { action } => handle_project(api.as_ref(), action).await,
        Commands::Task { action } => handle_task(api, &config, action).await,
        Commands::Comment { action } => handle_comment(api, action).await,
        Commands::Attachment { action } => handle_attachment(api, action).await,
        Commands::Activity { limit } => handle_activity(api.as_ref(), limit).await,
        Commands::Dashboard => handle_dashboard(api.as_ref()).await,
        Commands::Watch { project } => handle_watch(api, &config, project).await,
        Commands::LoginUrl => Ok(()),
    }
}

fn print_login_urls(config: &Config) -> Result<()> {
    if !config.hosted_ui.is_configured() {
        bail!("Hosted sign-in is not configured (auth.domain, auth.client_id, auth.redirect_uri)");
    }
    println!("Sign in:  {}", config.hosted_ui.login_url());
    println!("Sign out: {}", config.hosted_ui.logout_url());
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn handle_workspace(api: &dyn TaskboardApi, action: WorkspaceAction) -> Result<()> {
    match action {
        WorkspaceAction::List => {
            let workspaces = api.list_workspaces().await?;
            println!("{:<36} {}", "ID", "NAME");
            println!("{}", "-".repeat(60));
            for ws in workspaces {
                println!("{:<36} {}", ws.workspace_id, ws.name);
            }
        }
        WorkspaceAction::Create { name } => {
            api.create_workspace(&name).await?;
            println!("Created workspace: {}", name);
        }
    }
    Ok(())
}

async fn handle_project(api: &dyn TaskboardApi, action: ProjectAction) -> Result<()> {
    match action {
        ProjectAction::List { workspace } => {
            let projects = api.list_projects(&workspace).await?;
            println!("{:<36} {}", "ID", "NAME");
            println!("{}", "-".repeat(60));
            for project in projects {
                println!("{:<36} {}", project.project_id, project.name);
            }
        }
        ProjectAction::Create { workspace, name } => {
            api.create_project(&workspace, &name).await?;
            println!("Created project: {}", name);
        }
    }
    Ok(())
}

async fn handle_task(api: Arc<dyn TaskboardApi>, config: &Config, action: TaskAction) -> Result<()> {
    match action {
        TaskAction::List {
            project,
            search,
            status,
            priority,
            due,
        } => {
            let tasks = api.list_tasks(&project).await?;
            let filter = TaskFilter {
                search,
                status,
                priority,
                due: due.into(),
            };
            print_board(&tasks, &filter);
        }

        TaskAction::Create { project, title } => {
            if title.trim().is_empty() {
                bail!("Task title must not be empty");
            }
            api.create_task(&NewTask::new(project, title.trim())).await?;
            println!("Created task: {}", title.trim());
        }

        TaskAction::Move {
            project,
            task,
            status,
        } => {
            let view = ProjectView::mount(api, project, &config.sync_options(), None).await;
            let outcome = view.move_task(&task, status).await;
            view.unmount();
            match outcome.context("Failed to load tasks")? {
                DropOutcome::Confirmed => println!("Moved {} to {}", task, status.label()),
                DropOutcome::NoOp(reason) => println!("Nothing to do ({:?})", reason),
                DropOutcome::Invalidated { error } => {
                    return Err(anyhow::Error::new(error).context("Failed to update status"));
                }
            }
        }

        TaskAction::Update {
            project,
            task,
            title,
            description,
            priority,
            due,
        } => {
            let patch = TaskPatch {
                title: title.filter(|t| !t.trim().is_empty()),
                description,
                priority,
                due_date: due,
                ..Default::default()
            };
            if patch.is_empty() {
                bail!("Nothing to update; pass at least one of --title, --description, --priority, --due");
            }
            let view = ProjectView::mount(api, project, &config.sync_options(), None).await;
            let updated = view.update_task(&task, &patch).await;
            view.unmount();
            if updated? {
                println!("Updated task: {}", task);
            } else {
                bail!("Task {} not found in project", task);
            }
        }

        TaskAction::Show { id } => {
            let detail = TaskDetail::load(api, id).await?;

            println!("Comments ({}):", detail.comments.len());
            for comment in &detail.comments {
                println!(
                    "  [{}] {}: {}",
                    comment
                        .created_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".into()),
                    comment.author.as_deref().unwrap_or("-"),
                    comment.message
                );
            }

            println!("Activity ({}):", detail.activity.len());
            for entry in &detail.activity {
                println!(
                    "  [{}] {}",
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.message
                );
            }

            println!("Attachments ({}):", detail.attachments.len());
            for att in &detail.attachments {
                let kind = if is_image_file(&att.file_name) { "image" } else { "file" };
                println!("  {:<36} {:<6} {}", att.attachment_id, kind, att.file_name);
            }
        }
    }
    Ok(())
}

async fn handle_comment(api: Arc<dyn TaskboardApi>, action: CommentAction) -> Result<()> {
    match action {
        CommentAction::Add { task, message } => {
            let mut detail = TaskDetail::load(api, task).await?;
            if detail.add_comment(&message).await? {
                println!("Comment added ({} total)", detail.comments.len());
            } else {
                bail!("Comment must not be empty");
            }
        }
    }
    Ok(())
}

async fn handle_attachment(api: Arc<dyn TaskboardApi>, action: AttachmentAction) -> Result<()> {
    match action {
        AttachmentAction::List { task } => {
            let attachments = api.list_attachments(&task).await?;
            println!("{:<36} {:<24} {}", "ID", "TYPE", "FILE");
            println!("{}", "-".repeat(80));
            for att in attachments {
                println!(
                    "{:<36} {:<24} {}",
                    att.attachment_id,
                    att.content_type.as_deref().unwrap_or("-"),
                    att.file_name
                );
            }
        }

        AttachmentAction::Upload { task, path } => {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("Invalid file name: {}", path.display()))?
                .to_string();
            let body = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut detail = TaskDetail::load(api, task).await?;
            detail.upload_attachment(&file_name, body).await?;
            println!("Uploaded {} ({} attachments)", file_name, detail.attachments.len());
        }

        AttachmentAction::DownloadUrl { id } => {
            println!("{}", api.attachment_download_url(&id).await?);
        }

        AttachmentAction::Delete { task, id } => {
            let mut detail = TaskDetail::load(api, task).await?;
            detail.delete_attachment(&id).await?;
            println!("Deleted attachment: {}", id);
        }
    }
    Ok(())
}

async fn handle_activity(api: &dyn TaskboardApi, limit: usize) -> Result<()> {
    let feed = dashboard::activity_feed(api).await?;
    if feed.is_empty() {
        println!("No activity yet");
        return Ok(());
    }
    for entry in feed.iter().take(limit) {
        println!(
            "{}  {:<36} {}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.task_id.as_deref().unwrap_or("-"),
            entry.message
        );
    }
    Ok(())
}

async fn handle_dashboard(api: &dyn TaskboardApi) -> Result<()> {
    let tasks = dashboard::collect_tasks(api).await?;
    let stats = DashboardStats::compute(&tasks, today());

    println!("Total tasks:    {}", stats.total);
    println!("Completed:      {} ({}%)", stats.done, stats.completion_rate());
    println!("In progress:    {}", stats.in_progress);
    println!("Overdue:        {}", stats.overdue);
    println!("Due today:      {}", stats.due_today);
    println!("High priority:  {}", stats.high_priority);
    println!();
    for status in TaskStatus::ALL {
        println!("{:<12} {}", status.label(), stats.count(status));
    }
    if !stats.completion_trend.is_empty() {
        println!();
        println!("Completed per day:");
        for (day, count) in &stats.completion_trend {
            println!("  {}  {}", day, count);
        }
    }
    Ok(())
}

async fn handle_watch(api: Arc<dyn TaskboardApi>, config: &Config, project: String) -> Result<()> {
    let channel = RealtimeChannel::websocket(config.ws_url.clone(), config.reconnect_delay);
    let view = ProjectView::mount(api, project, &config.sync_options(), Some(&channel)).await;
    let mut changes = view.store().subscribe();
    let mut connection = channel.watch_state();
    let filter = TaskFilter::default();

    print_board(&changes.borrow_and_update(), &filter);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = changes.borrow_and_update().clone();
                println!();
                print_board(&snapshot, &filter);
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *connection.borrow_and_update();
                tracing::info!(state = ?state, "Realtime connection");
            }
        }
    }

    view.unmount();
    channel.shutdown();
    Ok(())
}

fn print_board(tasks: &[Task], filter: &TaskFilter) {
    for column in columns(tasks, filter, today()) {
        println!("{} ({})", column.status.label(), column.tasks.len());
        println!("{}", "-".repeat(80));
        for task in column.tasks {
            println!(
                "  {:<36} {:<7} {:<10} {}",
                task.task_id,
                task.priority.as_str(),
                task.due_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".into()),
                task.title
            );
        }
    }
}
