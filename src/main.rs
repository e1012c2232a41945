//! task-assign
//!
//! Serves the assignment API, or runs one assignment operation from the
//! command line and prints the result as JSON.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Serialize;
use std::net::SocketAddr;
use task_assign::api::{self, ApiState};
use task_assign::assign::Assigner;
use task_assign::cli::{AddEmployeeArgs, AddTaskArgs, Cli, Command, ServeArgs};
use task_assign::config::{Config, ConfigLoader, ConfigPaths};
use task_assign::db::Database;
use task_assign::logging::{self, LogTarget};
use task_assign::types::{NewEmployee, NewTask};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let target: LogTarget = cli.log.parse()?;
    logging::init(&target, cli.verbose)?;

    let mut paths = ConfigPaths::discover();
    if let Some(path) = &cli.config {
        paths = paths.with_file(path);
    }
    let mut loader = ConfigLoader::load_from(paths)?;
    if let Some(path) = loader.config_path() {
        info!(path = %path.display(), "Loaded configuration");
    }

    let config = loader.config_mut();
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(Command::Serve(args)) = &cli.command {
        apply_serve_overrides(config, args);
    }
    let config = loader.into_config();

    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path).with_context(|| {
        format!("failed to open database {}", config.server.db_path.display())
    })?;

    match cli.command {
        Some(Command::Serve(_)) | None => run_server(db, &config).await,
        Some(command) => run_command(db, &config, command),
    }
}

fn apply_serve_overrides(config: &mut Config, args: &ServeArgs) {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
}

async fn run_server(db: Database, config: &Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow!("invalid listen address: {}", e))?;

    let handle = api::start_server(ApiState::new(db, config), addr).await?;
    tokio::signal::ctrl_c().await?;
    handle.shutdown().await;
    Ok(())
}

fn run_command(db: Database, config: &Config, command: Command) -> Result<()> {
    let limit = config.server.listing_limit;
    let assigner = Assigner::new(db.clone(), &config.assignment);

    match command {
        Command::Serve(_) => Err(anyhow!("serve is not a one-shot command")),
        Command::Recommend { task_id } => print_json(&assigner.recommend(task_id)?),
        Command::Assign {
            task_id,
            employee: Some(employee_id),
        } => print_json(&assigner.assign_to(task_id, employee_id)?),
        Command::Assign {
            task_id,
            employee: None,
        } => print_json(&assigner.assign(task_id)?),
        Command::Complete { task_id } => print_json(&db.complete_task(task_id)?),
        Command::Important {
            search,
            candidates: true,
        } => print_json(&assigner.important_candidates(&search, limit)?),
        Command::Important {
            search,
            candidates: false,
        } => print_json(&db.important_tasks(&search, limit)?),
        Command::Workload { name, task } => {
            print_json(&db.employees_with_tasks(&name, &task, limit)?)
        }
        Command::Reconcile => print_json(&db.reconcile_workloads()?),
        Command::AddEmployee(args) => print_json(&db.create_employee(new_employee(args))?),
        Command::AddTask(args) => print_json(&db.create_task(new_task(args)?)?),
    }
}

fn new_employee(args: AddEmployeeArgs) -> NewEmployee {
    NewEmployee {
        full_name: args.full_name,
        position: args.position,
        telegram: args.telegram,
        date_begin: Some(task_assign::db::now_ms()),
    }
}

fn new_task(args: AddTaskArgs) -> Result<NewTask> {
    let date_end = args
        .deadline
        .map(|d| {
            chrono::DateTime::parse_from_rfc3339(&d)
                .map(|dt| dt.timestamp_millis())
                .map_err(|e| anyhow!("invalid deadline '{}': {}", d, e))
        })
        .transpose()?;

    Ok(NewTask {
        name: args.name,
        parent_task_id: args.parent,
        status: None,
        date_begin: Some(task_assign::db::now_ms()),
        date_end,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
