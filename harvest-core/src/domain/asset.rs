use serde::{Deserialize, Serialize};

/// A tradable asset from the universe listing.
///
/// Immutable once built. The ticker is always stored uppercased so that
/// trading-pair symbols can be derived by plain concatenation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    /// Stable, provider-assigned identifier (e.g. `bitcoin`).
    pub asset_id: String,
    /// Uppercased trading symbol (e.g. `BTC`).
    pub ticker: String,
    pub display_name: String,
}

impl Asset {
    pub fn new(
        asset_id: impl Into<String>,
        ticker: impl AsRef<str>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            ticker: ticker.as_ref().trim().to_uppercase(),
            display_name: display_name.into(),
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.ticker, self.asset_id)
    }
}
