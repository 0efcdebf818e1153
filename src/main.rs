//! Org Directory - department hierarchy and employee assignment from the command line.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use org_directory as app;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

use app::config::{AppConfig, ConfigLoadResult, LoggingConfig};
use app::db::{self, MemoryStore, SeaOrmStore};
use app::models::{CreateDepartment, CreateEmployee, DeleteMode, EmployeeOrder, UpdateDepartment};
use app::service::{DepartmentQuery, DepartmentService, EmployeeService};
use app::store::DirectoryStore;
use app::AppError;

/// Manage the department tree and the employees assigned to it.
#[derive(Parser)]
#[command(name = "org-directory")]
struct Cli {
    /// Use config.toml from current directory (dev mode)
    #[arg(long)]
    dev: bool,

    /// Explicit config file path
    #[arg(long, conflicts_with = "dev")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file to the selected config path
    InitConfig {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Create tables, indexes and triggers
    InitDb,
    /// Show server version, department and employee counts, and tree depth
    Status,
    /// Run a sample hierarchy scenario against an in-memory store
    Demo,
    /// Department operations
    #[command(subcommand)]
    Dept(DeptCommand),
    /// Employee operations
    #[command(subcommand)]
    Emp(EmpCommand),
}

#[derive(Subcommand)]
enum DeptCommand {
    /// Create a department
    Create {
        name: String,
        /// Parent department id (omit for a root department)
        #[arg(long)]
        parent: Option<i32>,
    },
    /// Show a department with its subtree
    Get {
        id: i32,
        /// Levels to include, 1 = the department only
        #[arg(long, default_value_t = 1)]
        depth: u32,
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        include_employees: bool,
        #[arg(long, value_enum, default_value_t = OrderArg::CreatedAt)]
        order: OrderArg,
    },
    /// Rename and/or move a department
    Update {
        id: i32,
        #[arg(long)]
        name: Option<String>,
        /// New parent department id
        #[arg(long, conflicts_with = "root")]
        parent: Option<i32>,
        /// Move the department to the root
        #[arg(long)]
        root: bool,
    },
    /// Delete a department
    Delete {
        id: i32,
        /// cascade | reassign (checked after the department is found)
        #[arg(long)]
        mode: String,
        /// Department receiving the employees in reassign mode
        #[arg(long)]
        reassign_to: Option<i32>,
    },
}

#[derive(Subcommand)]
enum EmpCommand {
    /// Create an employee in a department
    Create {
        department: i32,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        position: String,
        /// Hire date (YYYY-MM-DD)
        #[arg(long)]
        hired_at: Option<NaiveDate>,
    },
    /// List the employees of a department
    List {
        department: i32,
        #[arg(long, value_enum, default_value_t = OrderArg::CreatedAt)]
        order: OrderArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    CreatedAt,
    FullName,
}

impl From<OrderArg> for EmployeeOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::CreatedAt => EmployeeOrder::CreatedAt,
            OrderArg::FullName => EmployeeOrder::FullName,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Determine config path based on mode
    let config_path = match (&cli.config, cli.dev) {
        (Some(path), _) => path.clone(),
        (None, true) => PathBuf::from("config.toml"),
        (None, false) => AppConfig::default_path(),
    };

    let (config, load_error) = match AppConfig::try_load(&config_path) {
        ConfigLoadResult::Loaded(config) => (Some(config), None),
        ConfigLoadResult::Missing => (None, None),
        ConfigLoadResult::Invalid(e) => (None, Some(e)),
    };
    let loaded = config.is_some();
    let config = config.unwrap_or_default();

    // Initialize logging
    let _log_guard = init_logging(&config.logging);
    tracing::debug!("Config path: {:?}", config_path);

    if let Command::InitConfig { force } = cli.command {
        return match AppConfig::write_default(&config_path, force) {
            Ok(_) => {
                println!("Wrote default config to {}", config_path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                exit_code(&AppError::config(e.to_string()))
            }
        };
    }

    if let Some(e) = load_error {
        tracing::error!("Config invalid: {}", e);
        eprintln!("error: {e}");
        return exit_code(&AppError::config(e.to_string()));
    }
    if !loaded {
        tracing::warn!("Config missing at {:?}, using defaults", config_path);
    }

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            match e.downcast_ref::<AppError>() {
                Some(app_error) => exit_code(app_error),
                None => ExitCode::FAILURE,
            }
        }
    }
}

fn exit_code(error: &AppError) -> ExitCode {
    ExitCode::from(error.kind().exit_code() as u8)
}

/// Log to stderr, plus a daily rolling file when a directory is configured.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "org-directory.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}

async fn run(command: Command, config: AppConfig) -> anyhow::Result<()> {
    match command {
        Command::InitConfig { .. } => anyhow::bail!("init-config is handled before the config is loaded"),
        Command::Demo => run_demo(config).await?,
        Command::InitDb => {
            let conn = open(&config).await?;
            db::schema::install(&conn).await.context("failed to install schema")?;
            println!("Schema ready");
        }
        Command::Status => {
            let conn = open(&config).await?;
            let status = db::directory_status(&conn)
                .await
                .context("failed to read directory status; run init-db first")?;
            tracing::info!("PostgreSQL {}", status.server_version);
            print_json(&status)?;
        }
        Command::Dept(cmd) => {
            let store = Arc::new(SeaOrmStore::new(open(&config).await?));
            run_dept(DepartmentService::new(store, config.hierarchy), cmd).await?;
        }
        Command::Emp(cmd) => {
            let store = Arc::new(SeaOrmStore::new(open(&config).await?));
            run_emp(EmployeeService::new(store, config.hierarchy), cmd).await?;
        }
    }
    Ok(())
}

async fn open(config: &AppConfig) -> anyhow::Result<DatabaseConnection> {
    let conn = db::connect(&config.database)
        .await
        .with_context(|| format!("failed to connect to {}:{}", config.database.host, config.database.port))?;
    db::ping(&conn).await.context("database did not answer")?;
    Ok(conn)
}

async fn run_dept<S: DirectoryStore>(service: DepartmentService<S>, cmd: DeptCommand) -> anyhow::Result<()> {
    match cmd {
        DeptCommand::Create { name, parent } => {
            let dept = service.create(CreateDepartment { name, parent_id: parent }).await?;
            print_json(&dept)?;
        }
        DeptCommand::Get {
            id,
            depth,
            include_employees,
            order,
        } => {
            let query = DepartmentQuery {
                depth,
                include_employees,
                employee_order: order.into(),
            };
            print_json(&service.get_by_id(id, query).await?)?;
        }
        DeptCommand::Update { id, name, parent, root } => {
            let parent_id = if root { Some(None) } else { parent.map(Some) };
            let dept = service.update(id, UpdateDepartment { name, parent_id }).await?;
            print_json(&dept)?;
        }
        DeptCommand::Delete { id, mode, reassign_to } => {
            service.delete_by_mode_name(id, &mode, reassign_to).await?;
            println!("Department {id} deleted ({mode})");
        }
    }
    Ok(())
}

async fn run_emp<S: DirectoryStore>(service: EmployeeService<S>, cmd: EmpCommand) -> anyhow::Result<()> {
    match cmd {
        EmpCommand::Create {
            department,
            full_name,
            position,
            hired_at,
        } => {
            let emp = service
                .create(CreateEmployee {
                    department_id: department,
                    full_name,
                    position,
                    hired_at,
                })
                .await?;
            print_json(&emp)?;
        }
        EmpCommand::List { department, order } => {
            print_json(&service.list_by_department(department, order.into()).await?)?;
        }
    }
    Ok(())
}

/// Build a small tree in memory and walk through the hierarchy rules.
async fn run_demo(config: AppConfig) -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let departments = DepartmentService::new(Arc::clone(&store), config.hierarchy.clone());
    let employees = EmployeeService::new(store, config.hierarchy);

    let engineering = departments
        .create(CreateDepartment {
            name: "Engineering".to_string(),
            parent_id: None,
        })
        .await?;
    let backend = departments
        .create(CreateDepartment {
            name: "Backend".to_string(),
            parent_id: Some(engineering.id),
        })
        .await?;
    employees
        .create(CreateEmployee {
            department_id: backend.id,
            full_name: "A".to_string(),
            position: "Developer".to_string(),
            hired_at: None,
        })
        .await?;

    let query = DepartmentQuery {
        depth: 2,
        ..DepartmentQuery::default()
    };
    print_json(&departments.get_by_id(engineering.id, query).await?)?;

    let moved = departments
        .update(
            engineering.id,
            UpdateDepartment {
                name: None,
                parent_id: Some(Some(backend.id)),
            },
        )
        .await;
    match moved {
        Err(e) => println!("Move Engineering under Backend: {e}"),
        Ok(_) => anyhow::bail!("cycle was not detected"),
    }

    departments
        .delete(backend.id, DeleteMode::Reassign, Some(engineering.id))
        .await?;
    print_json(&departments.get_by_id(engineering.id, query).await?)?;

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
