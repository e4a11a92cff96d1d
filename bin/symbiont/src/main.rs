//! Symbiont - state aggregation engine for the Symbiotic restaking protocol.
//!
//! # Usage
//!
//! ```bash
//! # Replay a decoded event log into Postgres
//! symbiont replay --file events.ndjson
//!
//! # Same, against an in-memory store (nothing persisted)
//! symbiont replay --file events.ndjson --dry-run
//!
//! # Etherscan diagnostics for the known contract set
//! symbiont scan check-activity
//! symbiont scan find-deployment
//! ```

mod scan;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use symbiont_core::metrics::init_metrics;
use symbiont_core::models::StakingEvent;
use symbiont_core::ports::{EntityStore, WatchedSources};
use symbiont_core::services::AggregationEngine;
use symbiont_handlers::default_registry;
use symbiont_storage::{Database, DatabaseConfig, InMemoryEntityStore, PgEntityStore};

/// Symbiont CLI - Symbiotic protocol state aggregation.
#[derive(Parser, Debug)]
#[command(name = "symbiont")]
#[command(about = "Symbiont - Symbiotic restaking protocol aggregation engine")]
#[command(version)]
struct Cli {
    /// PostgreSQL database URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost/symbiont"
    )]
    database_url: String,

    /// Prometheus metrics port.
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Skip confirmation prompt for destructive operations (like purge).
    #[arg(long, short = 'y')]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a decoded event log (NDJSON, one event per line) through the
    /// aggregation engine.
    Replay {
        /// Path to the NDJSON event file, in canonical order.
        #[arg(long)]
        file: PathBuf,

        /// Aggregate into an in-memory store instead of Postgres.
        #[arg(long)]
        dry_run: bool,
    },

    /// Run database migrations and exit.
    Migrate,

    /// Purge all aggregated entities from the database and exit.
    ///
    /// Schema and migrations tracking are preserved.
    Purge,

    /// Etherscan diagnostics for the known Symbiotic contract set.
    Scan {
        #[command(subcommand)]
        target: scan::ScanCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    match cli.command {
        Command::Replay { file, dry_run } => {
            handle_replay(&cli.database_url, cli.metrics_port, &file, dry_run).await
        }
        Command::Migrate => {
            let db = connect(&cli.database_url).await?;
            info!("🗄️  Database ready (migrations applied)");
            db.close().await;
            Ok(())
        }
        Command::Purge => {
            let db = connect(&cli.database_url).await?;
            let result = handle_purge(&db, cli.yes).await;
            db.close().await;
            result
        }
        Command::Scan { target } => scan::run(target).await,
    }
}

/// Connect to the database and apply migrations.
async fn connect(database_url: &str) -> Result<Database> {
    debug!(database_url = %mask_password(database_url), "Database endpoint");

    info!("🗄️  Connecting to database...");
    let db = Database::connect(&DatabaseConfig::for_engine(database_url))
        .await
        .context("Failed to connect to database")?;

    db.migrate().await.context("Failed to run migrations")?;
    Ok(db)
}

/// Handle the replay command.
async fn handle_replay(
    database_url: &str,
    metrics_port: u16,
    file: &PathBuf,
    dry_run: bool,
) -> Result<()> {
    init_metrics_exporter(metrics_port);

    info!("🚀 Starting Symbiont replay");

    let (store, db): (Arc<dyn EntityStore>, Option<Database>) = if dry_run {
        info!("🧪 Dry run: aggregating into an in-memory store");
        (Arc::new(InMemoryEntityStore::new()), None)
    } else {
        let db = connect(database_url).await?;
        info!("🗄️  Database ready (migrations applied)");
        (Arc::new(PgEntityStore::new(&db)), Some(db))
    };

    let sources = Arc::new(WatchedSources::new());
    let engine = AggregationEngine::new(store, sources.clone(), Arc::new(default_registry()));

    let events = read_events(file)
        .with_context(|| format!("Failed to read events from {}", file.display()))?;
    info!(events = events.len(), "📥 Event log loaded");

    let applied = engine
        .replay(events)
        .await
        .context("Replay stopped on a failing event")?;

    info!(applied, vaults_watched = sources.len().await, "✅ Replay complete");

    if let Some(db) = db {
        db.close().await;
    }
    Ok(())
}

/// Read an NDJSON event file, skipping blank lines.
fn read_events(path: &PathBuf) -> Result<Vec<StakingEvent>> {
    let content = std::fs::read_to_string(path)?;
    let mut events = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event: StakingEvent = serde_json::from_str(line)
            .with_context(|| format!("Invalid event on line {}", line_no + 1))?;
        events.push(event);
    }
    Ok(events)
}

/// Handle the purge command.
async fn handle_purge(db: &Database, skip_confirmation: bool) -> Result<()> {
    warn!("⚠️  PURGE MODE: This will delete ALL aggregated entities!");
    warn!("   - Protocol, networks, operators, vaults, opt-ins");
    warn!("   - Activity records and daily metrics");
    warn!("   - Schema and migrations will be preserved");

    if !skip_confirmation {
        print!("\n🔴 Are you sure you want to purge all data? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            info!("❌ Purge cancelled");
            return Ok(());
        }
    }

    info!("🗑️  Purging database...");
    let stats = db.purge().await.context("Failed to purge database")?;

    info!("✅ Database purged successfully");
    info!("   📦 Entities removed: {}", stats.entities_removed);
    info!("   The engine will rebuild state on the next replay");

    Ok(())
}

/// Start the Prometheus exporter. Failures don't crash the app.
fn init_metrics_exporter(port: u16) {
    match format!("0.0.0.0:{port}").parse::<std::net::SocketAddr>() {
        Ok(addr) => match PrometheusBuilder::new().with_http_listener(addr).install() {
            Ok(()) => {
                init_metrics();
                info!("📊 Metrics: http://localhost:{port}/metrics");
            }
            Err(e) => {
                warn!("⚠️  Failed to start metrics exporter: {}. Continuing without metrics.", e);
            }
        },
        Err(e) => {
            warn!("⚠️  Invalid metrics address: {}. Continuing without metrics.", e);
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask password in database URL for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}
