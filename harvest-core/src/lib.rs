//! Harvest Core: domain types, the SQLite bar store, and market-data providers.
//!
//! This crate contains everything a single asset passes through:
//! - Domain types (assets, daily OHLCV bars)
//! - Store: watermark lookup, idempotent merge writer, read queries
//! - Providers: Binance daily klines, CoinGecko and static TOML universes
//!
//! Orchestration across many assets lives in `harvest-runner`.

pub mod data;
pub mod domain;
pub mod store;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything handed to pipeline workers is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Asset>();
        require_sync::<domain::Asset>();
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();

        require_send::<store::Database>();
        require_sync::<store::Database>();
        require_send::<store::WatermarkStore>();
        require_sync::<store::WatermarkStore>();
        require_send::<store::MergeWriter>();
        require_sync::<store::MergeWriter>();
        require_send::<store::StoreLock>();
        require_sync::<store::StoreLock>();

        require_send::<data::BinanceSource>();
        require_sync::<data::BinanceSource>();
        require_send::<data::FetchOutcome>();
        require_sync::<data::FetchOutcome>();
        require_send::<data::FetchError>();
        require_sync::<data::FetchError>();
        require_send::<data::CoinGeckoUniverse>();
        require_sync::<data::CoinGeckoUniverse>();
        require_send::<data::StaticUniverse>();
        require_sync::<data::StaticUniverse>();
    }

    /// PriceSource must stay object-safe: the runner holds it as `Arc<dyn PriceSource>`.
    #[test]
    fn price_source_is_object_safe() {
        fn _check(
            source: &dyn data::PriceSource,
            asset: &domain::Asset,
            from: chrono::NaiveDate,
        ) -> Result<data::FetchOutcome, data::FetchError> {
            source.fetch_since(asset, from)
        }
    }

    #[test]
    fn universe_source_is_object_safe() {
        let universe: Box<dyn data::UniverseSource> = Box::new(data::StaticUniverse::default());
        assert_eq!(universe.name(), "static");
        assert!(universe.load(10).unwrap().is_empty());
    }
}
