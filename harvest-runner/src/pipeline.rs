//! Bounded-concurrency harvest pipeline.
//!
//! Each asset runs watermark → fetch → merge on one worker of a private rayon
//! pool. Assets are independent: a failure is recorded against its asset and
//! never stops the others. Only the merge step is serialized, by the writer's
//! store lock; watermark reads and HTTP fetches overlap freely.

use crate::outcome::{AssetOutcome, AssetStatus, RunReport, Stage};
use crate::progress::HarvestProgress;
use chrono::NaiveDate;
use harvest_core::data::{FetchOutcome, PriceSource};
use harvest_core::domain::Asset;
use harvest_core::store::{Database, MergeWriter, WatermarkStore};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Worker threads when none are configured.
pub const DEFAULT_WORKERS: usize = 3;

/// Errors that prevent a run from starting.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Watermark → fetch → merge over a universe of assets.
pub struct Pipeline {
    source: Arc<dyn PriceSource>,
    watermarks: WatermarkStore,
    writer: MergeWriter,
    workers: usize,
}

impl Pipeline {
    pub fn new(db: Arc<Database>, source: Arc<dyn PriceSource>) -> Self {
        Self {
            source,
            watermarks: WatermarkStore::new(Arc::clone(&db)),
            writer: MergeWriter::new(db),
            workers: DEFAULT_WORKERS,
        }
    }

    /// Number of worker threads; clamped to at least one.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Watermark for assets with no stored bars.
    pub fn epoch(mut self, epoch: NaiveDate) -> Self {
        self.watermarks = self.watermarks.with_epoch(epoch);
        self
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Harvest every asset. Outcomes are returned in universe order.
    pub fn run(
        &self,
        assets: &[Asset],
        progress: &dyn HarvestProgress,
    ) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let total = assets.len();
        let completed = AtomicUsize::new(0);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("harvest-worker-{i}"))
            .build()
            .map_err(|e| PipelineError::ThreadPool(e.to_string()))?;

        info!(
            assets = total,
            workers = self.workers,
            source = self.source.name(),
            "starting harvest"
        );

        let outcomes: Vec<AssetOutcome> = pool.install(|| {
            assets
                .par_iter()
                .map(|asset| {
                    let outcome = self.process(asset);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.on_asset_complete(&outcome, done, total);
                    outcome
                })
                .collect()
        });

        let report = RunReport {
            outcomes,
            elapsed: started.elapsed(),
        };
        progress.on_run_complete(&report);
        Ok(report)
    }

    /// Run one asset to a terminal state.
    pub fn process(&self, asset: &Asset) -> AssetOutcome {
        let watermark = match self.watermarks.last_date(&asset.asset_id) {
            Ok(date) => date,
            Err(e) => {
                return AssetOutcome {
                    asset: asset.clone(),
                    watermark: None,
                    status: failed(asset, Stage::Watermark, &e),
                };
            }
        };
        debug!(asset = %asset.asset_id, %watermark, "watermark resolved");

        let status = match self.source.fetch_since(asset, watermark) {
            Err(e) => failed(asset, Stage::Fetch, &e),
            Ok(FetchOutcome::Unavailable { reason }) => AssetStatus::Unavailable { reason },
            Ok(FetchOutcome::Empty) => AssetStatus::Empty,
            Ok(FetchOutcome::Bars(bars)) => match self.writer.append(asset, &bars) {
                Ok(inserted) => AssetStatus::Saved {
                    fetched: bars.len(),
                    inserted,
                },
                Err(e) => failed(asset, Stage::Merge, &e),
            },
        };

        AssetOutcome {
            asset: asset.clone(),
            watermark: Some(watermark),
            status,
        }
    }
}

/// Record a stage failure against the asset, logging it at `warn`.
fn failed(asset: &Asset, stage: Stage, error: &dyn std::fmt::Display) -> AssetStatus {
    warn!(asset = %asset.asset_id, ticker = %asset.ticker, %stage, %error, "asset failed");
    AssetStatus::Failed {
        stage,
        error: error.to_string(),
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("source", &self.source.name())
            .field("workers", &self.workers)
            .field("epoch", &self.watermarks.epoch())
            .finish()
    }
}
