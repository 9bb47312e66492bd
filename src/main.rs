//! Sprintboard - ClickUp sprint reports over HTTP
//!
//! Collects sprint task data from ClickUp, computes per-sprint commitment
//! and delivery figures normalized against each sprint's top contributor,
//! and serves the result as JSON and HTML.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, upstream, I/O, bind failure, etc.)

mod analysis;
mod cli;
mod collector;
mod config;
mod error;
mod models;
mod refresh;
mod report;
mod scheduler;
mod server;
mod storage;

use anyhow::{Context, Result};
use cli::Args;
use collector::{ClickUpCollector, FileSource, RecordSource};
use config::{Config, DEFAULT_CONFIG_FILE};
use refresh::Refresher;
use std::sync::Arc;
use storage::ReportStore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Sprintboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let outcome = if args.once {
        run_once(&args).await
    } else {
        run_server(&args).await
    };

    if let Err(e) = outcome {
        error!("{:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .sprintboard.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Set team_id there, and export API_TOKEN before starting.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        Config::load(config_path)?
    } else {
        match Config::load_default() {
            Ok(Some(config)) => {
                info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
                config
            }
            Ok(None) => {
                debug!("No config file found, using defaults");
                Config::default()
            }
            Err(e) => {
                warn!("Failed to load config: {:#}", e);
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    Ok(config)
}

/// Pick the record source: an offline file when --input is given, ClickUp otherwise.
fn build_source(args: &Args, config: &Config) -> Result<Arc<dyn RecordSource>> {
    if let Some(ref input) = args.input {
        return Ok(Arc::new(FileSource::new(input)));
    }

    let collector = ClickUpCollector::new(config.collector_config())
        .context("Cannot create ClickUp collector")?;
    Ok(Arc::new(collector))
}

/// Run a single refresh and print its summary.
async fn run_once(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let store = ReportStore::new(&config.storage.data_dir);
    let refresher = Refresher::new(build_source(args, &config)?, store);

    let summary = refresher.refresh().await.context("Refresh failed")?;

    println!("Sprints data refreshed:");
    println!("   Records: {}", summary.records);
    println!("   Sprints: {}", summary.sprints);
    println!("   Team members: {}", summary.team_members);
    println!("   Duration: {:.1}s", summary.duration_seconds);
    println!(
        "   Report saved to: {}",
        refresher.store().report_path().display()
    );

    Ok(())
}

/// Serve the HTTP API, with the periodic refresh running alongside.
async fn run_server(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let store = ReportStore::new(&config.storage.data_dir);
    let refresher = Arc::new(Refresher::new(build_source(args, &config)?, store));

    info!("Data directory: {}", refresher.store().data_dir().display());

    let scheduler = if config.scheduler.enabled {
        Some(scheduler::spawn_scheduler(
            refresher.clone(),
            config.scheduler.refresh_period(),
            config.scheduler.refresh_on_startup,
        ))
    } else {
        info!("Scheduler disabled; refresh with GET /reload");
        None
    };

    let state = server::AppState {
        refresher,
        report_page: config.server.report_page.clone(),
    };

    let result = server::serve(&config.bind_address(), state).await;

    if let Some(handle) = scheduler {
        handle.abort();
    }

    result
}
