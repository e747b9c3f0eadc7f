//! Per-asset outcomes and the run report.

use chrono::NaiveDate;
use harvest_core::domain::Asset;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Pipeline stage an asset failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Watermark,
    Fetch,
    Merge,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Watermark => "watermark",
            Stage::Fetch => "fetch",
            Stage::Merge => "merge",
        };
        f.write_str(name)
    }
}

/// Terminal state of one asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssetStatus {
    /// Bars were fetched and merged. `inserted` excludes rows already stored.
    Saved { fetched: usize, inserted: usize },
    /// The provider does not list the asset.
    Unavailable { reason: String },
    /// The provider had no bars on or after the watermark.
    Empty,
    /// A stage failed; the error is kept as its message.
    Failed { stage: Stage, error: String },
}

impl AssetStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, AssetStatus::Failed { .. })
    }

    /// Rows this asset added to the store.
    pub fn inserted(&self) -> usize {
        match self {
            AssetStatus::Saved { inserted, .. } => *inserted,
            _ => 0,
        }
    }
}

/// Result of harvesting one asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetOutcome {
    pub asset: Asset,
    /// `None` when the watermark could not be resolved.
    pub watermark: Option<NaiveDate>,
    pub status: AssetStatus,
}

impl AssetOutcome {
    /// One-line, human-readable summary.
    pub fn summary(&self) -> String {
        let ticker = &self.asset.ticker;
        match &self.status {
            AssetStatus::Saved { fetched, inserted } => {
                format!("{ticker}: saved {inserted} rows ({fetched} fetched)")
            }
            AssetStatus::Unavailable { .. } | AssetStatus::Empty => {
                format!("{ticker}: no data available")
            }
            AssetStatus::Failed { stage, error } => format!("{ticker}: {stage} failed: {error}"),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// One entry per asset, in universe order.
    pub outcomes: Vec<AssetOutcome>,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn saved(&self) -> usize {
        self.count(|s| matches!(s, AssetStatus::Saved { .. }))
    }

    pub fn empty(&self) -> usize {
        self.count(|s| matches!(s, AssetStatus::Empty))
    }

    pub fn unavailable(&self) -> usize {
        self.count(|s| matches!(s, AssetStatus::Unavailable { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(AssetStatus::is_failed)
    }

    /// Rows added to the store across all assets.
    pub fn rows_inserted(&self) -> usize {
        self.outcomes.iter().map(|o| o.status.inserted()).sum()
    }

    pub fn outcome(&self, asset_id: &str) -> Option<&AssetOutcome> {
        self.outcomes.iter().find(|o| o.asset.asset_id == asset_id)
    }

    fn count(&self, pred: impl Fn(&AssetStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
