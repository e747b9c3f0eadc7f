use super::{parse_stored_date, Database, StoreError};
use chrono::NaiveDate;
use rusqlite::params;
use std::sync::Arc;

/// First date ever requested for an asset with nothing stored yet.
pub fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).expect("2015-01-01 is a valid date")
}

/// Answers "what is the last stored date for asset X".
///
/// Read-only and safe to call from many workers at once: every call opens its
/// own connection and never takes the store's write lock. The answer is
/// recomputed on every call; nothing is cached between assets.
#[derive(Debug)]
pub struct WatermarkStore {
    db: Arc<Database>,
    epoch: NaiveDate,
}

impl WatermarkStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            epoch: default_epoch(),
        }
    }

    /// Override the date returned for assets with no stored bars.
    pub fn with_epoch(mut self, epoch: NaiveDate) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// Latest stored date for the asset across all sources, or the epoch if none.
    pub fn last_date(&self, asset_id: &str) -> Result<NaiveDate, StoreError> {
        let conn = self.db.connect()?;
        Database::ensure_schema(&conn)?;

        let latest: Option<String> = conn.query_row(
            "SELECT MAX(date) FROM daily_bars WHERE asset_id = ?1",
            params![asset_id],
            |row| row.get(0),
        )?;

        match latest {
            Some(value) => parse_stored_date(asset_id, &value),
            None => Ok(self.epoch),
        }
    }
}
