use super::{Database, StoreError, StoreLock};
use crate::domain::{Asset, Bar};
use rusqlite::params;
use std::sync::Arc;

const INSERT_SQL: &str = "
INSERT OR IGNORE INTO daily_bars
    (asset_id, symbol, display_name, data_source, date, open, high, low, close, volume)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
";

/// Appends fetched bars with insert-if-absent semantics.
///
/// Bars whose natural key is already stored are skipped, so overlapping
/// ranges and repeated runs never duplicate or rewrite a row. All writes for
/// one `append` call commit as a single transaction, and transactions from
/// concurrent workers never interleave: each runs under the writer's
/// `StoreLock`.
#[derive(Debug)]
pub struct MergeWriter {
    db: Arc<Database>,
    lock: StoreLock,
}

impl MergeWriter {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            lock: StoreLock::new(),
        }
    }

    /// The lock serializing this writer's transactions.
    pub fn lock(&self) -> &StoreLock {
        &self.lock
    }

    /// Insert the bars that are not stored yet. Returns the number of new rows.
    pub fn append(&self, asset: &Asset, bars: &[Bar]) -> Result<usize, StoreError> {
        if bars.is_empty() {
            return Ok(0);
        }
        if let Some(stray) = bars.iter().find(|b| b.asset_id != asset.asset_id) {
            return Err(StoreError::AssetMismatch {
                asset_id: asset.asset_id.clone(),
                bar_asset: stray.asset_id.clone(),
            });
        }

        let _guard = self.lock.acquire();

        let mut conn = self.db.connect()?;
        Database::ensure_schema(&conn)?;
        let tx = conn.transaction()?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(INSERT_SQL)?;
            for bar in bars {
                inserted += stmt.execute(params![
                    bar.asset_id,
                    asset.ticker,
                    asset.display_name,
                    bar.data_source,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open.to_string(),
                    bar.high.to_string(),
                    bar.low.to_string(),
                    bar.close.to_string(),
                    bar.volume.to_string(),
                ])?;
            }
        }
        tx.commit()?;

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreReader;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn bitcoin() -> Asset {
        Asset::new("bitcoin", "BTC", "Bitcoin")
    }

    fn bar(day: u32, close: i64) -> Bar {
        Bar {
            asset_id: "bitcoin".into(),
            data_source: "binance".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: Decimal::new(close * 100 - 50, 2),
            high: Decimal::new(close * 100 + 125, 2),
            low: Decimal::new(close * 100 - 75, 2),
            close: Decimal::from(close),
            volume: Decimal::new(123_456, 3),
        }
    }

    fn memory_writer(name: &str) -> (Arc<Database>, MergeWriter) {
        let db = Arc::new(Database::in_memory(name).unwrap());
        (Arc::clone(&db), MergeWriter::new(db))
    }

    #[test]
    fn empty_append_is_a_noop() {
        let (db, writer) = memory_writer("writer_empty");
        assert_eq!(writer.append(&bitcoin(), &[]).unwrap(), 0);
        assert_eq!(StoreReader::new(db).row_count(None).unwrap(), 0);
    }

    #[test]
    fn append_writes_all_new_bars() {
        let (db, writer) = memory_writer("writer_new_bars");
        let bars = vec![bar(1, 42_000), bar(2, 43_000), bar(3, 44_000)];

        assert_eq!(writer.append(&bitcoin(), &bars).unwrap(), 3);

        let stored = StoreReader::new(db).load_bars("bitcoin").unwrap();
        assert_eq!(stored, bars);
    }

    #[test]
    fn append_twice_is_idempotent() {
        let (db, writer) = memory_writer("writer_idempotent");
        let bars = vec![bar(1, 42_000), bar(2, 43_000)];

        assert_eq!(writer.append(&bitcoin(), &bars).unwrap(), 2);
        assert_eq!(writer.append(&bitcoin(), &bars).unwrap(), 0);
        assert_eq!(StoreReader::new(db).row_count(Some("bitcoin")).unwrap(), 2);
    }

    #[test]
    fn overlap_keeps_first_value() {
        let (db, writer) = memory_writer("writer_overlap");
        writer.append(&bitcoin(), &[bar(1, 42_000), bar(2, 43_000)]).unwrap();

        // Day 2 arrives again with a different close; only day 3 is new.
        let inserted = writer
            .append(&bitcoin(), &[bar(2, 99_999), bar(3, 44_000)])
            .unwrap();
        assert_eq!(inserted, 1);

        let stored = StoreReader::new(db).load_bars("bitcoin").unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[1].close, Decimal::from(43_000));
    }

    #[test]
    fn same_date_from_another_source_is_a_different_row() {
        let (db, writer) = memory_writer("writer_two_sources");
        let mut other = bar(1, 42_000);
        other.data_source = "other".into();

        writer.append(&bitcoin(), &[bar(1, 42_000)]).unwrap();
        assert_eq!(writer.append(&bitcoin(), &[other]).unwrap(), 1);
        assert_eq!(StoreReader::new(db).row_count(Some("bitcoin")).unwrap(), 2);
    }

    #[test]
    fn rejects_bars_of_another_asset() {
        let (db, writer) = memory_writer("writer_mismatch");
        let mut stray = bar(1, 1);
        stray.asset_id = "ethereum".into();

        let result = writer.append(&bitcoin(), &[bar(2, 2), stray]);
        assert!(matches!(result, Err(StoreError::AssetMismatch { .. })));
        assert_eq!(StoreReader::new(db).row_count(None).unwrap(), 0);
    }

    #[test]
    fn lock_released_after_failed_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.db");
        let db = Arc::new(Database::open_file(&path).unwrap());
        let writer = MergeWriter::new(Arc::clone(&db));

        // Make every insert fail inside the transaction.
        db.connect()
            .unwrap()
            .execute_batch("DROP TABLE daily_bars; CREATE TABLE daily_bars (only_column TEXT);")
            .unwrap();

        assert!(writer.append(&bitcoin(), &[bar(1, 1)]).is_err());
        assert!(!writer.lock().is_held());
    }
}
