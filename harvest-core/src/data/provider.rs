//! Price source trait and structured fetch outcomes.
//!
//! The PriceSource trait abstracts over history providers so the pipeline can
//! run against Binance in production and a scripted fake in tests.

use crate::domain::{Asset, Bar};
use chrono::NaiveDate;
use thiserror::Error;

/// What a provider had to say about one asset.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The provider does not trade this asset. Not an error.
    Unavailable { reason: String },
    /// Nothing new since the requested date.
    Empty,
    /// One or more normalized bars, in provider order (ascending date).
    Bars(Vec<Bar>),
}

impl FetchOutcome {
    /// Fetched bars; empty for `Unavailable` and `Empty`.
    pub fn bars(&self) -> &[Bar] {
        match self {
            FetchOutcome::Bars(bars) => bars,
            FetchOutcome::Unavailable { .. } | FetchOutcome::Empty => &[],
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, FetchOutcome::Unavailable { .. })
    }
}

/// Structured errors for a single asset's fetch.
///
/// None of these are fatal to a run; the pipeline records them against the
/// asset and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("request for {symbol} failed: {message}")]
    Transport { symbol: String, message: String },

    #[error("HTTP {status} for {symbol}")]
    HttpStatus { symbol: String, status: u16 },

    #[error("unexpected response for {symbol}: {message}")]
    Decode { symbol: String, message: String },

    #[error("malformed row {index} for {symbol}: {reason}")]
    MalformedRow {
        symbol: String,
        index: usize,
        reason: String,
    },
}

/// Trait for daily price history providers.
pub trait PriceSource: Send + Sync {
    /// Identifier written into each bar's `data_source`.
    fn name(&self) -> &str;

    /// Fetch daily bars for the asset starting at `from` (inclusive).
    fn fetch_since(&self, asset: &Asset, from: NaiveDate) -> Result<FetchOutcome, FetchError>;
}
