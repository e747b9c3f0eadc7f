//! Harvest CLI: incremental daily price harvesting.
//!
//! Commands:
//! - `run`: load the universe, fetch new daily bars, merge them into the store
//! - `status`: report per-asset coverage of the store

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use harvest_core::store::{Database, StoreReader};
use harvest_runner::{run_harvest, HarvestConfig, HarvestProgress, LogProgress, StdoutProgress};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "harvest",
    about = "Harvest: incremental daily OHLCV collector"
)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch new daily bars for the top assets and merge them into the store.
    Run {
        /// SQLite database file.
        #[arg(long)]
        db: Option<PathBuf>,

        /// Worker threads.
        #[arg(long)]
        workers: Option<usize>,

        /// Number of top-ranked assets to harvest.
        #[arg(long)]
        limit: Option<usize>,

        /// Static universe TOML file instead of the CoinGecko listing.
        #[arg(long)]
        universe_file: Option<PathBuf>,

        /// Klines pages per asset (1000 days each).
        #[arg(long)]
        max_pages: Option<usize>,

        /// HTTP timeout in seconds. Requests wait indefinitely when omitted.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// First date (YYYY-MM-DD) requested for assets with nothing stored.
        #[arg(long)]
        epoch: Option<String>,

        /// Report progress through the log instead of stdout.
        #[arg(long, default_value_t = false)]
        log_progress: bool,
    },
    /// Report stored date ranges and row counts per asset.
    Status {
        /// SQLite database file.
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            db,
            workers,
            limit,
            universe_file,
            max_pages,
            timeout_secs,
            epoch,
            log_progress,
        } => {
            if let Some(db) = db {
                config.database_path = db;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if let Some(limit) = limit {
                config.universe_limit = limit;
            }
            if let Some(file) = universe_file {
                config.universe_file = Some(file);
            }
            if let Some(pages) = max_pages {
                config.max_pages = pages;
            }
            if let Some(secs) = timeout_secs {
                config.request_timeout_secs = Some(secs);
            }
            if let Some(epoch) = epoch {
                config.epoch = NaiveDate::parse_from_str(&epoch, "%Y-%m-%d")
                    .with_context(|| format!("invalid --epoch '{epoch}'"))?;
            }
            run_harvest_cmd(&config, log_progress)
        }
        Commands::Status { db } => {
            if let Some(db) = db {
                config.database_path = db;
            }
            run_status(&config.database_path)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<HarvestConfig> {
    match path {
        Some(path) => HarvestConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(HarvestConfig::default()),
    }
}

fn run_harvest_cmd(config: &HarvestConfig, log_progress: bool) -> Result<()> {
    if config.request_timeout_secs.is_some() {
        tracing::info!(
            secs = ?config.request_timeout_secs,
            "request timeout enabled; slow pairs may now fail instead of waiting"
        );
    }

    let progress: Box<dyn HarvestProgress> = if log_progress {
        Box::new(LogProgress)
    } else {
        Box::new(StdoutProgress)
    };

    // Per-asset failures are reported, not returned; only run-level errors exit non-zero.
    run_harvest(config, progress.as_ref()).context("harvest aborted")?;
    Ok(())
}

fn run_status(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        println!("Database does not exist: {}", db_path.display());
        return Ok(());
    }

    let db = Arc::new(Database::open_file(db_path)?);
    let reader = StoreReader::new(db);
    let summaries = reader.status()?;

    if summaries.is_empty() {
        println!("Database is empty: {}", db_path.display());
        return Ok(());
    }

    let total_rows: usize = summaries.iter().map(|s| s.row_count).sum();

    println!("Database: {}", db_path.display());
    println!("Assets: {}", summaries.len());
    println!("Total bars: {total_rows}");
    println!();
    println!(
        "{:<10} {:<24} {:<25} {:>8}",
        "Symbol", "Asset", "Date Range", "Bars"
    );
    println!("{}", "-".repeat(70));
    for s in &summaries {
        println!(
            "{:<10} {:<24} {:<25} {:>8}",
            s.symbol,
            s.asset_id,
            format!("{} to {}", s.first_date, s.last_date),
            s.row_count
        );
    }

    Ok(())
}
