//! Progress reporting for harvest runs.

use crate::outcome::{AssetOutcome, AssetStatus, RunReport};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// Observer notified as assets finish.
///
/// Called from pool workers, so implementations must be `Sync`; events for
/// different assets arrive in completion order, not universe order.
pub trait HarvestProgress: Send + Sync {
    /// Called once the universe is known, before any asset starts.
    fn on_universe_loaded(&self, _source: &str, _count: usize) {}

    /// Called once per asset when it reaches a terminal state.
    fn on_asset_complete(&self, outcome: &AssetOutcome, completed: usize, total: usize);

    /// Called once after every asset has finished.
    fn on_run_complete(&self, report: &RunReport);
}

/// Reports through `tracing`: `info` per asset, `warn` for failures.
pub struct LogProgress;

impl HarvestProgress for LogProgress {
    fn on_asset_complete(&self, outcome: &AssetOutcome, completed: usize, total: usize) {
        let asset = &outcome.asset;
        match &outcome.status {
            AssetStatus::Saved { fetched, inserted } => info!(
                asset = %asset.asset_id,
                ticker = %asset.ticker,
                fetched,
                inserted,
                "[{completed}/{total}] saved {inserted} rows ({fetched} fetched)"
            ),
            AssetStatus::Unavailable { reason } => info!(
                asset = %asset.asset_id,
                ticker = %asset.ticker,
                reason = %reason,
                "[{completed}/{total}] no data available"
            ),
            AssetStatus::Empty => info!(
                asset = %asset.asset_id,
                ticker = %asset.ticker,
                "[{completed}/{total}] no data available"
            ),
            AssetStatus::Failed { stage, error } => warn!(
                asset = %asset.asset_id,
                ticker = %asset.ticker,
                stage = %stage,
                "[{completed}/{total}] failed: {error}"
            ),
        }
    }

    fn on_run_complete(&self, report: &RunReport) {
        info!(
            saved = report.saved(),
            empty = report.empty(),
            unavailable = report.unavailable(),
            failed = report.failed(),
            rows = report.rows_inserted(),
            "harvest finished in {:.2}s",
            report.elapsed.as_secs_f64()
        );
    }
}

/// Prints one line per asset to stdout, failures to stderr.
pub struct StdoutProgress;

impl HarvestProgress for StdoutProgress {
    fn on_universe_loaded(&self, source: &str, count: usize) {
        println!("Loaded {count} assets from {source}.");
    }

    fn on_asset_complete(&self, outcome: &AssetOutcome, completed: usize, total: usize) {
        if outcome.status.is_failed() {
            eprintln!("[{completed}/{total}] {}", outcome.summary());
        } else {
            println!("[{completed}/{total}] {}", outcome.summary());
        }
    }

    fn on_run_complete(&self, report: &RunReport) {
        println!(
            "\nHarvest complete: {} saved ({} new rows), {} without data, {} failed of {}",
            report.saved(),
            report.rows_inserted(),
            report.empty() + report.unavailable(),
            report.failed(),
            report.total()
        );
        println!("Finished in {:.2} seconds.", report.elapsed.as_secs_f64());
    }
}

/// Discards all events.
pub struct NoProgress;

impl HarvestProgress for NoProgress {
    fn on_asset_complete(&self, _outcome: &AssetOutcome, _completed: usize, _total: usize) {}

    fn on_run_complete(&self, _report: &RunReport) {}
}

/// Counts events. Useful in tests.
#[derive(Debug, Default)]
pub struct CountingProgress {
    assets: AtomicUsize,
    runs: AtomicUsize,
}

impl CountingProgress {
    pub fn assets(&self) -> usize {
        self.assets.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl HarvestProgress for CountingProgress {
    fn on_asset_complete(&self, _outcome: &AssetOutcome, _completed: usize, _total: usize) {
        self.assets.fetch_add(1, Ordering::SeqCst);
    }

    fn on_run_complete(&self, _report: &RunReport) {
        self.runs.fetch_add(1, Ordering::SeqCst);
    }
}
