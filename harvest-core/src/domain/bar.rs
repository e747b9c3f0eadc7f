use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One daily OHLCV observation for an asset from a single data source.
///
/// Natural key: `(asset_id, data_source, date)`. The store holds at most one
/// bar per key and never rewrites a stored bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub asset_id: String,
    pub data_source: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    /// The natural key identifying this bar in the store.
    pub fn key(&self) -> (&str, &str, NaiveDate) {
        (&self.asset_id, &self.data_source, self.date)
    }
}
