//! planboard server binary.

use anyhow::Result;
use clap::Parser;
use planboard::api::{self, AppState};
use planboard::config::AppConfig;
use planboard::db::Database;
use planboard::schedule::Scheduler;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Project/task management server with schedule recalculation.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// HTTP port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database.path = Some(database);
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let db_path = config.database.resolve_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!("opening database at {}", db_path.display());
    let db = Arc::new(Database::open(&db_path)?);

    let scheduler = Arc::new(Scheduler::new(config.schedule.completed_dates));
    let state = AppState::new(db, scheduler, config.schedule.on_delete_with_dependents);

    api::serve(state, config.server.port).await
}
