//! # Phone Reach CLI
//!
//! Command-line interface for the phone-reach library (`phone_reach_core`).
//! This binary parses arguments, sets up configuration, opens the store, and
//! dispatches the intake, probe, and broadcast operations.

use phone_reach_core::{
    load_sheet, new_session_gate, run_broadcast, run_intake, spawn_probe, Config, ConfigBuilder,
    NumberStore, SqliteStore,
};

// Dependencies specific to the CLI binary
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Classifies phone lists and probes/broadcasts over the messaging web client.",
    long_about = "Phone Reach ingests spreadsheets of raw phone numbers, normalizes and classifies \
                  them by country, deduplicates them against a local store, and drives a WebDriver \
                  browser session to check which numbers are registered on the messaging platform \
                  and to broadcast a message to the reachable ones."
)]
struct AppArgs {
    /// Path to a configuration file (TOML format) to load settings from. CLI args override file settings.
    #[arg(long, env = "PHONE_REACH_CONFIG")]
    config_file: Option<String>,

    /// Path of the SQLite database file.
    #[arg(long, env = "PHONE_REACH_DB")]
    db: Option<String>,

    /// URL of the running WebDriver instance.
    #[arg(long, env = "PHONE_REACH_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Browser user-data directory for a persistent authenticated session.
    #[arg(long, env = "PHONE_REACH_PROFILE_DIR")]
    profile_dir: Option<String>,

    /// Run the browser headless (interactive QR login needs a visible window).
    #[arg(long, action = clap::ArgAction::SetTrue, env = "PHONE_REACH_HEADLESS")]
    headless: Option<bool>,

    /// Quick login-marker check timeout in seconds.
    #[arg(long, env = "PHONE_REACH_LOGIN_TIMEOUT")]
    login_timeout: Option<u64>,

    /// Interactive login wait in seconds (time to scan the login code).
    #[arg(long, env = "PHONE_REACH_INTERACTIVE_TIMEOUT")]
    interactive_timeout: Option<u64>,

    /// Per-number element wait in seconds.
    #[arg(long, env = "PHONE_REACH_ELEMENT_TIMEOUT")]
    element_timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a spreadsheet of phone numbers into the store.
    Intake {
        /// Path to the .xlsx/.xls/.csv file to process.
        #[arg(short, long)]
        file: String,
    },
    /// Check which stored numbers are registered on the messaging platform.
    Probe,
    /// Send a message to every number marked reachable.
    Broadcast {
        /// The message text to send.
        #[arg(short, long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_thread_names(true)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Setting up tracing subscriber failed")?;

    tracing::info!("Phone Reach CLI v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = AppArgs::parse();
    tracing::debug!("Parsed CLI arguments: {:?}", args);

    let mut config_builder = ConfigBuilder::new();

    if let Some(ref path) = args.config_file {
        config_builder = config_builder.config_file(path);
    }
    if let Some(ref db) = args.db {
        config_builder = config_builder.db_path(db);
    }
    if let Some(ref url) = args.webdriver_url {
        config_builder = config_builder.webdriver_url(url);
    }
    if let Some(ref dir) = args.profile_dir {
        config_builder = config_builder.browser_profile_dir(Some(dir));
    }
    if args.headless == Some(true) {
        config_builder = config_builder.headless(true);
    }
    if let Some(t) = args.login_timeout {
        config_builder = config_builder.login_check_timeout(Duration::from_secs(t));
    }
    if let Some(t) = args.interactive_timeout {
        config_builder = config_builder.login_interactive_timeout(Duration::from_secs(t));
    }
    if let Some(t) = args.element_timeout {
        config_builder = config_builder.element_timeout(Duration::from_secs(t));
    }

    let config = match config_builder.build() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return Err(anyhow::anyhow!("Failed to build configuration: {}", e));
        }
    };
    tracing::debug!("Effective configuration loaded: {:?}", *config);

    let store: Arc<dyn NumberStore> = Arc::new(
        SqliteStore::open(&config.db_path)
            .map_err(|e| anyhow::anyhow!("Failed to open store at {}: {}", config.db_path.display(), e))?,
    );

    match args.command {
        Command::Intake { file } => intake_command(&config, store.as_ref(), &file),
        Command::Probe => probe_command(config, store).await,
        Command::Broadcast { message } => broadcast_command(&config, store.as_ref(), &message).await,
    }
}

fn intake_command(config: &Config, store: &dyn NumberStore, file: &str) -> Result<()> {
    let path = Path::new(file);
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!("Input file not found or is not a file: {}", file));
    }

    tracing::info!(
        "Running intake. Input: '{}', store: '{}'",
        file,
        config.db_path.display()
    );
    let start_time = Instant::now();

    let sheet = load_sheet(path).map_err(|e| anyhow::anyhow!("Failed to load '{}': {}", file, e))?;
    tracing::info!("Loaded {} rows from input file.", sheet.rows.len());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .context("Failed to set progress style")?,
    );
    pb.set_message(format!("Processing {} rows...", sheet.rows.len()));
    pb.enable_steady_tick(Duration::from_millis(120));

    let report = run_intake(store, &sheet);
    pb.finish_and_clear();

    let report = report.map_err(|e| anyhow::anyhow!("Intake failed: {}", e))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    tracing::info!(
        "Intake finished in {:.2?}: {} new valid, {} new invalid (totals: {} valid / {} invalid)",
        start_time.elapsed(),
        report.new_valid,
        report.new_invalid,
        report.total_valid,
        report.total_invalid
    );
    Ok(())
}

async fn probe_command(config: Arc<Config>, store: Arc<dyn NumberStore>) -> Result<()> {
    let gate = new_session_gate();
    let handle = spawn_probe(config, store, gate);
    println!("Scanning started; results land in the store as each number is checked.");

    // The CLI process hosts the background task, so it waits for completion
    // before exiting; a service embedding the library would return here.
    match handle.await {
        Ok(Some(report)) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Ok(None) => Err(anyhow::anyhow!(
            "Probe run failed; see the log output for details"
        )),
        Err(e) => Err(anyhow::anyhow!("Probe task panicked: {}", e)),
    }
}

async fn broadcast_command(
    config: &Config,
    store: &dyn NumberStore,
    message: &str,
) -> Result<()> {
    let gate = new_session_gate();
    let start_time = Instant::now();

    let report = run_broadcast(config, store, &gate, message)
        .await
        .map_err(|e| anyhow::anyhow!("Broadcast failed: {}", e))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    tracing::info!(
        "Broadcast finished in {:.2?}: {} of {} sends succeeded",
        start_time.elapsed(),
        report.sent,
        report.attempted
    );
    Ok(())
}
