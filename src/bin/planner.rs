//! planner CLI: serve the HTTP API or operate on workers and shifts directly.

use anyhow::{Context as _, bail};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use validator::Validate;
use work_planner::api;
use work_planner::config::Config;
use work_planner::config::secrets::ExposeSecret;
use work_planner::db::Db;
use work_planner::model::{Shift, ShiftsFilter, Worker, WorkerId, WorkersFilter, invalid_fields};
use work_planner::planner::Planner;
use work_planner::repository::{MemoryRepository, Repository};
use work_planner::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "planner", about = "Worker registry and daily shift booking")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Keep all data in process memory, even if DATABASE_URL is set
        #[arg(long)]
        in_memory: bool,
    },
    /// Worker operations
    Worker {
        #[command(subcommand)]
        action: WorkerAction,
    },
    /// Shift operations
    Shift {
        #[command(subcommand)]
        action: ShiftAction,
    },
}

#[derive(Subcommand)]
enum WorkerAction {
    /// Register a worker
    Add {
        /// Display name
        name: String,
    },
    /// List workers
    List {
        /// Case-insensitive name substring
        #[arg(long)]
        name: Option<String>,
    },
    /// Show a worker
    Show {
        /// Worker ID (full UUID or prefix)
        id: String,
    },
}

#[derive(Subcommand)]
enum ShiftAction {
    /// Book a shift
    Book {
        /// Worker ID
        worker_id: WorkerId,
        /// Day of the shift (YYYY-MM-DD or RFC 3339)
        date: String,
        /// First hour (0-23)
        start_hour: i32,
        /// Hour the shift ends (1-24)
        end_hour: i32,
    },
    /// List shifts
    List {
        /// Only this worker's shifts
        #[arg(long)]
        worker: Option<WorkerId>,
        /// Only shifts on this day (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Serve { in_memory } => cmd_serve(config, in_memory).await,
        Command::Worker { action } => {
            let planner = connect(&config).await?;
            match action {
                WorkerAction::Add { name } => cmd_worker_add(&planner, name).await,
                WorkerAction::List { name } => cmd_worker_list(&planner, name).await,
                WorkerAction::Show { id } => cmd_worker_show(&planner, id).await,
            }
        }
        Command::Shift { action } => {
            let planner = connect(&config).await?;
            match action {
                ShiftAction::Book {
                    worker_id,
                    date,
                    start_hour,
                    end_hour,
                } => cmd_shift_book(&planner, worker_id, &date, start_hour, end_hour).await,
                ShiftAction::List { worker, date } => {
                    cmd_shift_list(&planner, worker, date.as_deref()).await
                }
            }
        }
    }
}

/// One-shot commands always work against Postgres.
async fn connect(config: &Config) -> anyhow::Result<Planner<Db>> {
    let Some(url) = config.database_url.as_ref() else {
        bail!("DATABASE_URL is not set");
    };
    let db = Db::connect_with(url.expose_secret(), config.database_max_connections).await?;
    db.migrate().await?;
    Ok(Planner::with_config(db, config.planner.clone()))
}

async fn cmd_serve(config: Config, in_memory: bool) -> anyhow::Result<()> {
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "work-planner".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "Listening for connections");

    match config.database_url.as_ref() {
        Some(url) if !in_memory => {
            let db =
                Db::connect_with(url.expose_secret(), config.database_max_connections).await?;
            db.migrate().await?;
            info!("Database connection established");
            run(listener, Planner::with_config(db, config.planner.clone()), &config).await
        }
        _ => {
            warn!("Using in-memory store; data is lost on exit");
            let repo = MemoryRepository::new();
            run(listener, Planner::with_config(repo, config.planner.clone()), &config).await
        }
    }
}

async fn run<R: Repository>(
    listener: TcpListener,
    planner: Planner<R>,
    config: &Config,
) -> anyhow::Result<()> {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(api::serve(listener, planner, async move {
        let _ = shutdown_rx.changed().await;
        info!("HTTP server shutting down");
    }));

    tokio::select! {
        _ = shutdown_signal() => info!("Received shutdown signal"),
        result = &mut server => {
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e).context("server error"),
                Err(e) => Err(e).context("server task panicked"),
            };
        }
    }

    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(config.shutdown_timeout, server).await {
        Ok(Ok(Ok(()))) => info!("Server stopped"),
        Ok(Ok(Err(e))) => error!(error = %e, "Server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "Server task panicked"),
        Err(_) => warn!(
            timeout = ?config.shutdown_timeout,
            "Server did not drain in time"
        ),
    }
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.ok();
}

async fn cmd_worker_add(planner: &Planner<Db>, name: String) -> anyhow::Result<()> {
    let worker = Worker::new(name);
    if let Err(errors) = worker.validate() {
        bail!("invalid fields: {}", invalid_fields(&errors).join(", "));
    }

    let worker = planner.create_worker(worker).await?;
    println!("Created: {} ({})", worker.id, worker.name);
    Ok(())
}

async fn cmd_worker_list(planner: &Planner<Db>, name: Option<String>) -> anyhow::Result<()> {
    let workers = planner.list_workers(WorkersFilter { name }).await?;

    if workers.is_empty() {
        println!("No workers found.");
        return Ok(());
    }

    println!("{:<36}  NAME", "ID");
    println!("{}", "-".repeat(60));
    for worker in &workers {
        println!("{:<36}  {}", worker.id, worker.name);
    }

    println!("\n{} worker(s)", workers.len());
    Ok(())
}

async fn cmd_worker_show(planner: &Planner<Db>, id_str: String) -> anyhow::Result<()> {
    // Support prefix matching, like the short IDs people copy from listings
    let id = if id_str.len() < 36 {
        let workers = planner.list_workers(WorkersFilter::default()).await?;
        let matches: Vec<_> = workers
            .iter()
            .filter(|w| w.id.to_string().starts_with(&id_str))
            .collect();
        match matches.len() {
            0 => bail!("no worker matching prefix '{id_str}'"),
            1 => matches[0].id,
            n => bail!("{n} workers match prefix '{id_str}', be more specific"),
        }
    } else {
        id_str.parse::<WorkerId>()?
    };

    let worker = planner.get_worker(id).await?;
    let shifts = planner
        .list_shifts(ShiftsFilter {
            worker_id: Some(worker.id),
            date: None,
        })
        .await?;

    println!("ID:      {}", worker.id);
    println!("Name:    {}", worker.name);
    println!("Shifts:  {}", shifts.len());
    for shift in &shifts {
        println!(
            "  {}  {:02}:00-{:02}:00",
            shift.date.format("%Y-%m-%d"),
            shift.start_hour,
            shift.end_hour
        );
    }
    Ok(())
}

async fn cmd_shift_book(
    planner: &Planner<Db>,
    worker_id: WorkerId,
    date: &str,
    start_hour: i32,
    end_hour: i32,
) -> anyhow::Result<()> {
    let shift = Shift::new(worker_id, parse_day(date)?, start_hour, end_hour);
    if let Err(errors) = shift.validate() {
        bail!("invalid fields: {}", invalid_fields(&errors).join(", "));
    }

    let shift = planner.create_shift(shift).await?;
    println!(
        "Booked: {} on {} {:02}:00-{:02}:00",
        shift.id,
        shift.date.format("%Y-%m-%d"),
        shift.start_hour,
        shift.end_hour
    );
    Ok(())
}

async fn cmd_shift_list(
    planner: &Planner<Db>,
    worker: Option<WorkerId>,
    date: Option<&str>,
) -> anyhow::Result<()> {
    let filter = ShiftsFilter {
        worker_id: worker,
        date: date.map(parse_day).transpose()?,
    };
    let shifts = planner.list_shifts(filter).await?;

    if shifts.is_empty() {
        println!("No shifts found.");
        return Ok(());
    }

    println!("{:<10}  {:<36}  HOURS", "DATE", "WORKER");
    println!("{}", "-".repeat(64));
    for shift in &shifts {
        println!(
            "{:<10}  {:<36}  {:02}-{:02}",
            shift.date.format("%Y-%m-%d"),
            shift.worker_id,
            shift.start_hour,
            shift.end_hour
        );
    }

    println!("\n{} shift(s)", shifts.len());
    Ok(())
}

/// Accept a bare calendar date or a full RFC 3339 timestamp.
fn parse_day(s: &str) -> anyhow::Result<DateTime<FixedOffset>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Ok(date);
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD or RFC 3339"))?;
    Ok(day.and_time(NaiveTime::MIN).and_utc().fixed_offset())
}
