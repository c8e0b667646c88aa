use clap::Parser;
use formdesk_core::actions::FormActions;
use formdesk_core::config::{self, ConfigOverrides, MessageBackend, Settings};
use formdesk_core::error::AppError;
use formdesk_core::ids::TaskIdGenerator;
use formdesk_core::model::{ContactMessage, Task};
use formdesk_core::storage::{
    JsonTaskStore, MemoryMessageStore, MessageStore, RestMessageStore, TaskStore,
};
use formdesk_server::cli::{Cli, Command, ListCommand, collect_config_overrides};
use formdesk_server::web::{self, AppState};
use std::sync::Arc;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Tabled)]
struct TaskRow {
    id: i64,
    text: String,
}

#[derive(Tabled)]
struct MessageRow {
    id: i64,
    date: String,
    #[tabled(rename = "type")]
    kind: String,
    name: String,
    email: String,
    message: String,
}

fn print_tasks(tasks: &[Task], json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string(tasks)?);
        return Ok(());
    }

    let rows = tasks.iter().map(|task| TaskRow {
        id: task.id,
        text: task.text.clone(),
    });
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
    Ok(())
}

fn print_messages(messages: &[ContactMessage], json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string(messages)?);
        return Ok(());
    }

    let rows = messages.iter().map(|message| MessageRow {
        id: message.id,
        date: message.created_at.date().to_string(),
        kind: message.message_type.to_string(),
        name: message.name.clone(),
        email: message.email.clone(),
        message: message.message.clone(),
    });
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn message_store(settings: &mut Settings) -> Result<Arc<dyn MessageStore>, AppError> {
    match settings.message_backend {
        MessageBackend::Memory => Ok(Arc::new(MemoryMessageStore::new())),
        MessageBackend::Rest => {
            let rest = settings
                .rest
                .take()
                .ok_or_else(|| AppError::invalid_input("rest backend is not configured"))?;
            Ok(Arc::new(RestMessageStore::new(rest)))
        }
    }
}

async fn serve(mut settings: Settings) -> Result<(), AppError> {
    let tasks = Arc::new(JsonTaskStore::new(&settings.tasks_path));
    let ids = match tasks.last_id().await {
        Ok(Some(last_id)) => TaskIdGenerator::starting_after(last_id),
        Ok(None) => TaskIdGenerator::new(),
        Err(err) => {
            warn!(error = %err, path = %settings.tasks_path.display(), "could not read existing tasks");
            TaskIdGenerator::new()
        }
    };
    let messages = message_store(&mut settings)?;
    if !settings.message_backend.is_durable() {
        warn!(
            backend = ?settings.message_backend,
            "contact messages are kept in memory and lost on restart; set message_backend to rest to persist them"
        );
    }

    let actions = FormActions::new(tasks, messages)
        .with_ids(ids)
        .with_write_delay(settings.write_delay);
    let app = web::router(AppState::new(actions));

    let listener = tokio::net::TcpListener::bind(settings.bind).await?;
    info!(
        addr = %settings.bind,
        tasks = %settings.tasks_path.display(),
        backend = ?settings.message_backend,
        "formdesk listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn list(mut settings: Settings, list: ListCommand, json: bool) -> Result<(), AppError> {
    match list {
        ListCommand::Tasks => {
            let tasks = JsonTaskStore::new(&settings.tasks_path).list_all().await?;
            print_tasks(&tasks, json)
        }
        ListCommand::Messages => {
            let messages = message_store(&mut settings)?.select_ordered().await?;
            print_messages(&messages, json)
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut overrides: ConfigOverrides =
        collect_config_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
    if let Some(Command::Serve { bind, tasks_path }) = &cli.command {
        if let Some(bind) = bind {
            overrides.bind = Some(bind.clone());
        }
        if let Some(path) = tasks_path {
            overrides.tasks_path = Some(path.clone());
        }
    }

    let loaded = config::load_config_with_fallback();
    let settings = Settings::resolve(&loaded.config, &overrides)?;
    init_tracing(&settings.log_level);
    if let Some(err) = loaded.error {
        warn!(error = %err, "ignoring configuration file, using defaults");
    }

    match cli.command {
        None | Some(Command::Serve { .. }) => serve(settings).await,
        Some(Command::List { list: which }) => list(settings, which, cli.json).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli).await {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
