//! Harvest Runner: configuration, the pooled pipeline, and run reporting.
//!
//! This crate builds on `harvest-core` to provide:
//! - `HarvestConfig`: TOML configuration with defaults and validation
//! - `Pipeline`: watermark → fetch → merge per asset on a private rayon pool
//! - Per-asset outcomes and the `RunReport`
//! - `HarvestProgress` observers (stdout, tracing, silent, counting)
//! - `run_harvest`: universe + pipeline, end to end

pub mod config;
pub mod harvest;
pub mod outcome;
pub mod pipeline;
pub mod progress;

pub use config::{ConfigError, HarvestConfig};
pub use harvest::{harvest, run_harvest, HarvestError};
pub use outcome::{AssetOutcome, AssetStatus, RunReport, Stage};
pub use pipeline::{Pipeline, PipelineError, DEFAULT_WORKERS};
pub use progress::{CountingProgress, HarvestProgress, LogProgress, NoProgress, StdoutProgress};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn pipeline_is_send_sync() {
        assert_send::<Pipeline>();
        assert_sync::<Pipeline>();
    }

    #[test]
    fn outcome_types_are_send_sync() {
        assert_send::<AssetOutcome>();
        assert_sync::<AssetOutcome>();
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<HarvestConfig>();
        assert_sync::<HarvestConfig>();
    }

    #[test]
    fn progress_reporters_are_send_sync() {
        assert_send::<LogProgress>();
        assert_sync::<LogProgress>();
        assert_send::<CountingProgress>();
        assert_sync::<CountingProgress>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<HarvestError>();
        assert_sync::<HarvestError>();
    }
}
