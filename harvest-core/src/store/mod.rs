//! SQLite bar store.
//!
//! Layout: one `daily_bars` table keyed by `(asset_id, data_source, date)`.
//!
//! - `Database`: explicit store handle (file or named in-memory database)
//! - `WatermarkStore`: last stored date per asset, with an epoch default
//! - `MergeWriter`: insert-if-absent appends, serialized by a `StoreLock`
//! - `StoreReader`: read-side queries for reporting and tests
//!
//! Dates are stored as ISO `YYYY-MM-DD` text so `MAX(date)` is chronological.
//! Prices are stored as decimal text so provider values round-trip exactly.

pub mod database;
pub mod lock;
pub mod reader;
pub mod watermark;
pub mod writer;

pub use database::Database;
pub use lock::{StoreLock, StoreLockGuard};
pub use reader::{AssetSummary, StoreReader};
pub use watermark::{default_epoch, WatermarkStore};
pub use writer::MergeWriter;

use thiserror::Error;

/// Structured errors for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid stored date '{value}' for asset '{asset_id}'")]
    InvalidDate { asset_id: String, value: String },

    #[error("invalid stored {column} '{value}' for asset '{asset_id}'")]
    InvalidDecimal {
        asset_id: String,
        column: &'static str,
        value: String,
    },

    #[error("bar for asset '{bar_asset}' cannot be appended under asset '{asset_id}'")]
    AssetMismatch { asset_id: String, bar_asset: String },
}

/// Parse an ISO date read back from the store.
pub(crate) fn parse_stored_date(asset_id: &str, value: &str) -> Result<chrono::NaiveDate, StoreError> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| StoreError::InvalidDate {
        asset_id: asset_id.to_string(),
        value: value.to_string(),
    })
}
