//! Top-level run: load the universe, then harvest it.

use crate::config::{ConfigError, HarvestConfig};
use crate::outcome::RunReport;
use crate::pipeline::{Pipeline, PipelineError};
use crate::progress::HarvestProgress;
use harvest_core::data::{
    BinanceSource, CoinGeckoUniverse, FetchError, StaticUniverse, UniverseError, UniverseSource,
};
use harvest_core::store::{Database, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors that abort a whole run. Per-asset failures are never among them.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("universe error: {0}")]
    Universe(#[from] UniverseError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("price source error: {0}")]
    Source(#[from] FetchError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Load up to `limit` assets from `universe` and run them through `pipeline`.
///
/// A universe failure aborts before any asset is fetched.
pub fn harvest(
    universe: &dyn UniverseSource,
    pipeline: &Pipeline,
    limit: usize,
    progress: &dyn HarvestProgress,
) -> Result<RunReport, HarvestError> {
    let assets = universe.load(limit)?;
    info!(universe = universe.name(), assets = assets.len(), "universe loaded");
    progress.on_universe_loaded(universe.name(), assets.len());
    Ok(pipeline.run(&assets, progress)?)
}

/// Build the store, providers and pipeline from `config` and run once.
pub fn run_harvest(
    config: &HarvestConfig,
    progress: &dyn HarvestProgress,
) -> Result<RunReport, HarvestError> {
    config.validate()?;

    let db = Arc::new(Database::open_file(config.database_path.clone())?);
    let source = Arc::new(BinanceSource::new(config.binance_config())?);
    let pipeline = Pipeline::new(db, source)
        .workers(config.workers)
        .epoch(config.epoch);

    let universe: Box<dyn UniverseSource> = match &config.universe_file {
        Some(path) => Box::new(StaticUniverse::from_file(path)?),
        None => Box::new(CoinGeckoUniverse::new(config.coingecko_base_url.clone())?),
    };

    harvest(universe.as_ref(), &pipeline, config.universe_limit, progress)
}
