//! Universe sources: the ranked list of assets a run harvests.
//!
//! The CoinGecko listing is the production source. A static universe can be
//! stored as a TOML file with one `[[assets]]` table per asset, for offline
//! runs and reproducible tests.

use crate::domain::Asset;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors while loading the universe. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("universe request for page {page} failed: {message}")]
    Transport { page: usize, message: String },

    #[error("HTTP {status} for universe page {page}")]
    HttpStatus { page: usize, status: u16 },

    #[error("unexpected universe response on page {page}: {message}")]
    Decode { page: usize, message: String },

    #[error("read universe file {path}: {message}")]
    File { path: String, message: String },

    #[error("parse universe TOML: {0}")]
    Parse(String),
}

/// Trait for universe listings.
pub trait UniverseSource: Send + Sync {
    /// Human-readable name, for logs.
    fn name(&self) -> &str;

    /// The first `limit` assets in ranking order.
    fn load(&self, limit: usize) -> Result<Vec<Asset>, UniverseError>;
}

/// One entry of a static universe file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetEntry {
    pub id: String,
    pub ticker: String,
    pub name: String,
}

/// A fixed universe, in file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticUniverse {
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

impl StaticUniverse {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path).map_err(|e| UniverseError::File {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        toml::from_str(content).map_err(|e| UniverseError::Parse(e.to_string()))
    }

    /// Build a universe from assets, e.g. to snapshot a live listing.
    pub fn from_assets(assets: &[Asset]) -> Self {
        Self {
            assets: assets
                .iter()
                .map(|a| AssetEntry {
                    id: a.asset_id.clone(),
                    ticker: a.ticker.clone(),
                    name: a.display_name.clone(),
                })
                .collect(),
        }
    }

    /// Serialize the universe to TOML.
    pub fn to_toml(&self) -> Result<String, UniverseError> {
        toml::to_string_pretty(self).map_err(|e| UniverseError::Parse(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl UniverseSource for StaticUniverse {
    fn name(&self) -> &str {
        "static"
    }

    fn load(&self, limit: usize) -> Result<Vec<Asset>, UniverseError> {
        Ok(self
            .assets
            .iter()
            .take(limit)
            .map(|e| Asset::new(&e.id, &e.ticker, &e.name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIVERSE: &str = r#"
[[assets]]
id = "bitcoin"
ticker = "btc"
name = "Bitcoin"

[[assets]]
id = "ethereum"
ticker = "ETH"
name = "Ethereum"

[[assets]]
id = "tether"
ticker = "usdt"
name = "Tether"
"#;

    #[test]
    fn parses_assets_in_order() {
        let universe = StaticUniverse::from_toml(UNIVERSE).unwrap();
        assert_eq!(universe.len(), 3);

        let assets = universe.load(10).unwrap();
        assert_eq!(assets[0], Asset::new("bitcoin", "BTC", "Bitcoin"));
        assert_eq!(assets[2].ticker, "USDT");
    }

    #[test]
    fn load_respects_limit() {
        let universe = StaticUniverse::from_toml(UNIVERSE).unwrap();
        let assets = universe.load(2).unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[1].asset_id, "ethereum");
    }

    #[test]
    fn empty_file_is_empty_universe() {
        let universe = StaticUniverse::from_toml("").unwrap();
        assert!(universe.is_empty());
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let result = StaticUniverse::from_toml("[[assets]]\nid = 3");
        assert!(matches!(result, Err(UniverseError::Parse(_))));
    }

    #[test]
    fn toml_roundtrip() {
        let assets = vec![Asset::new("bitcoin", "BTC", "Bitcoin")];
        let toml_str = StaticUniverse::from_assets(&assets).to_toml().unwrap();
        let parsed = StaticUniverse::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.load(5).unwrap(), assets);
    }

    #[test]
    fn missing_file_is_file_error() {
        let result = StaticUniverse::from_file(Path::new("/nonexistent/universe.toml"));
        assert!(matches!(result, Err(UniverseError::File { .. })));
    }
}
