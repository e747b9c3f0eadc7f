//! Property tests for store invariants.
//!
//! Uses proptest to verify:
//! 1. Idempotence: appending the same bars twice leaves the store as once
//! 2. Natural-key uniqueness: overlapping batches never duplicate a day
//! 3. Watermark: the last date is the maximum stored date, or the epoch

use chrono::{Days, NaiveDate};
use harvest_core::domain::{Asset, Bar};
use harvest_core::store::{default_epoch, Database, MergeWriter, StoreReader, WatermarkStore};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

fn fresh_db() -> Arc<Database> {
    let id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    Arc::new(Database::in_memory(&format!("store_props_{}_{id}", std::process::id())).unwrap())
}

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

fn bar_at(offset: u64, cents: i64) -> Bar {
    let px = Decimal::new(cents, 2);
    Bar {
        asset_id: "bitcoin".into(),
        data_source: "binance".into(),
        date: base() + Days::new(offset),
        open: px,
        high: px,
        low: px,
        close: px,
        volume: Decimal::new(cents * 3, 1),
    }
}

fn btc() -> Asset {
    Asset::new("bitcoin", "BTC", "Bitcoin")
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_batch() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((0u64..400, 1i64..10_000_000), 0..40)
        .prop_map(|days| days.into_iter().map(|(d, c)| bar_at(d, c)).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Appending the same batch twice stores exactly what one append stores.
    #[test]
    fn append_is_idempotent(batch in arb_batch()) {
        let db = fresh_db();
        let writer = MergeWriter::new(Arc::clone(&db));
        let reader = StoreReader::new(Arc::clone(&db));

        writer.append(&btc(), &batch).unwrap();
        let once = reader.load_bars("bitcoin").unwrap();

        let second = writer.append(&btc(), &batch).unwrap();
        prop_assert_eq!(second, 0);
        prop_assert_eq!(reader.load_bars("bitcoin").unwrap(), once);
    }

    /// Every stored day appears once, and the first write for a day wins.
    #[test]
    fn natural_key_is_unique(first in arb_batch(), second in arb_batch()) {
        let db = fresh_db();
        let writer = MergeWriter::new(Arc::clone(&db));

        let a = writer.append(&btc(), &first).unwrap();
        let b = writer.append(&btc(), &second).unwrap();

        let stored = StoreReader::new(db).load_bars("bitcoin").unwrap();
        let distinct: BTreeSet<NaiveDate> =
            first.iter().chain(second.iter()).map(|bar| bar.date).collect();

        prop_assert_eq!(stored.len(), distinct.len());
        prop_assert_eq!(a + b, distinct.len());

        for bar in &stored {
            let winner = first
                .iter()
                .chain(second.iter())
                .find(|b| b.date == bar.date)
                .unwrap();
            prop_assert_eq!(bar, winner);
        }
    }

    /// The watermark is the latest stored date, or the epoch for an empty store.
    #[test]
    fn watermark_is_max_date(batch in arb_batch()) {
        let db = fresh_db();
        MergeWriter::new(Arc::clone(&db)).append(&btc(), &batch).unwrap();

        let expected = batch.iter().map(|b| b.date).max().unwrap_or_else(default_epoch);
        let watermark = WatermarkStore::new(db).last_date("bitcoin").unwrap();
        prop_assert_eq!(watermark, expected);
    }
}
