use super::{parse_stored_date, Database, StoreError};
use crate::domain::Bar;
use chrono::NaiveDate;
use rusqlite::params;
use rusqlite::types::Value;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

/// Stored coverage for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSummary {
    pub asset_id: String,
    pub symbol: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub row_count: usize,
}

/// Read-side queries over the bar store.
#[derive(Debug)]
pub struct StoreReader {
    db: Arc<Database>,
}

impl StoreReader {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Number of stored rows, for one asset or for the whole store.
    pub fn row_count(&self, asset_id: Option<&str>) -> Result<usize, StoreError> {
        let conn = self.db.connect()?;
        Database::ensure_schema(&conn)?;
        let count: i64 = match asset_id {
            Some(id) => conn.query_row(
                "SELECT COUNT(*) FROM daily_bars WHERE asset_id = ?1",
                params![id],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM daily_bars", [], |row| row.get(0))?,
        };
        Ok(count as usize)
    }

    /// All stored bars for an asset, ordered by date then source.
    pub fn load_bars(&self, asset_id: &str) -> Result<Vec<Bar>, StoreError> {
        let conn = self.db.connect()?;
        Database::ensure_schema(&conn)?;

        let mut stmt = conn.prepare(
            "SELECT data_source, date, open, high, low, close, volume
             FROM daily_bars WHERE asset_id = ?1
             ORDER BY date, data_source",
        )?;
        let rows = stmt.query_map(params![asset_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                [
                    row.get::<_, Value>(2)?,
                    row.get::<_, Value>(3)?,
                    row.get::<_, Value>(4)?,
                    row.get::<_, Value>(5)?,
                    row.get::<_, Value>(6)?,
                ],
            ))
        })?;

        let mut bars = Vec::new();
        for row in rows {
            let (data_source, date, [open, high, low, close, volume]) = row?;
            bars.push(Bar {
                asset_id: asset_id.to_string(),
                data_source,
                date: parse_stored_date(asset_id, &date)?,
                open: to_decimal(asset_id, "open", open)?,
                high: to_decimal(asset_id, "high", high)?,
                low: to_decimal(asset_id, "low", low)?,
                close: to_decimal(asset_id, "close", close)?,
                volume: to_decimal(asset_id, "volume", volume)?,
            });
        }
        Ok(bars)
    }

    /// Coverage of every stored asset, ordered by symbol.
    pub fn status(&self) -> Result<Vec<AssetSummary>, StoreError> {
        let conn = self.db.connect()?;
        Database::ensure_schema(&conn)?;

        let mut stmt = conn.prepare(
            "SELECT asset_id, MAX(symbol), MIN(date), MAX(date), COUNT(*)
             FROM daily_bars
             GROUP BY asset_id
             ORDER BY MAX(symbol), asset_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (asset_id, symbol, first, last, count) = row?;
            summaries.push(AssetSummary {
                first_date: parse_stored_date(&asset_id, &first)?,
                last_date: parse_stored_date(&asset_id, &last)?,
                row_count: count as usize,
                asset_id,
                symbol,
            });
        }
        Ok(summaries)
    }
}

/// Decode a stored price. Text is the native encoding; REAL and INTEGER
/// columns written by other tools are accepted too.
fn to_decimal(asset_id: &str, column: &'static str, value: Value) -> Result<Decimal, StoreError> {
    let parsed = match &value {
        Value::Text(text) => text.parse::<Decimal>().ok(),
        Value::Real(real) => Decimal::try_from(*real).ok(),
        Value::Integer(int) => Some(Decimal::from(*int)),
        Value::Null | Value::Blob(_) => None,
    };
    parsed.ok_or_else(|| StoreError::InvalidDecimal {
        asset_id: asset_id.to_string(),
        column,
        value: format!("{value:?}"),
    })
}
