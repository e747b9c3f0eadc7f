//! Harvest configuration.
//!
//! Loaded from TOML; every field has a default, so an empty file (or no file)
//! reproduces the stock behavior: top 1000 assets, 3 workers, one Binance
//! page per asset, no request timeout.
//!
//! ```toml
//! database_path = "data/prices.db"
//! workers = 3
//! universe_limit = 1000
//! epoch = "2015-01-01"
//! quote_asset = "USDT"
//! max_pages = 1
//! # request_timeout_secs = 30
//! # universe_file = "universe.toml"
//! ```

use chrono::NaiveDate;
use harvest_core::data::binance::{self, BinanceConfig, MAX_PAGE_LIMIT};
use harvest_core::data::coingecko;
use harvest_core::store::default_epoch;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::pipeline::DEFAULT_WORKERS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {message}")]
    Io { path: String, message: String },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for one harvest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestConfig {
    /// SQLite file holding `daily_bars`.
    pub database_path: PathBuf,
    pub workers: usize,
    /// Number of top-ranked assets to harvest.
    pub universe_limit: usize,
    /// First date requested for an asset with nothing stored.
    pub epoch: NaiveDate,
    pub quote_asset: String,
    /// Candles per klines request.
    pub page_limit: usize,
    /// Klines requests per asset per run.
    pub max_pages: usize,
    /// Unset means requests never time out.
    pub request_timeout_secs: Option<u64>,
    pub binance_base_url: String,
    pub coingecko_base_url: String,
    /// Static TOML universe; unset means CoinGecko.
    pub universe_file: Option<PathBuf>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/prices.db"),
            workers: DEFAULT_WORKERS,
            universe_limit: 1000,
            epoch: default_epoch(),
            quote_asset: "USDT".to_string(),
            page_limit: MAX_PAGE_LIMIT,
            max_pages: 1,
            request_timeout_secs: None,
            binance_base_url: binance::DEFAULT_BASE_URL.to_string(),
            coingecko_base_url: coingecko::DEFAULT_BASE_URL.to_string(),
            universe_file: None,
        }
    }
}

impl HarvestConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.universe_limit == 0 {
            return Err(ConfigError::Invalid("universe_limit must be at least 1".into()));
        }
        if self.page_limit == 0 || self.page_limit > MAX_PAGE_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "page_limit must be between 1 and {MAX_PAGE_LIMIT}, got {}",
                self.page_limit
            )));
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Invalid("max_pages must be at least 1".into()));
        }
        if self.quote_asset.trim().is_empty() {
            return Err(ConfigError::Invalid("quote_asset must not be empty".into()));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive; omit it for no timeout".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn binance_config(&self) -> BinanceConfig {
        BinanceConfig {
            base_url: self.binance_base_url.clone(),
            quote_asset: self.quote_asset.trim().to_uppercase(),
            page_limit: self.page_limit,
            max_pages: self.max_pages,
            timeout: self.request_timeout(),
        }
    }
}
