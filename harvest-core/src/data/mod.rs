//! Market-data providers: daily price history and the asset universe.

pub mod binance;
pub mod coingecko;
pub mod provider;
pub mod universe;

pub use binance::{BinanceConfig, BinanceSource, KlineResponse, BINANCE_SOURCE};
pub use coingecko::CoinGeckoUniverse;
pub use provider::{FetchError, FetchOutcome, PriceSource};
pub use universe::{StaticUniverse, UniverseError, UniverseSource};
