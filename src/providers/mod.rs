//! Sleep record providers
//!
//! This module supplies raw sleep records to the pipeline, either from the
//! live provider API or from the bundled offline sample dataset. The
//! orchestrator picks the source from the patient's credential.

mod oura;
mod sample;

pub use oura::OuraClient;
pub use sample::BundledSample;

use crate::error::PipelineError;

/// Bounded ceiling for every external request; there is no retry.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Trait for sources of raw sleep records
pub trait SleepRecordSource {
    /// Fetch the raw records for the trailing evaluation window,
    /// oldest to newest.
    fn fetch_records(&self) -> Result<Vec<serde_json::Value>, PipelineError>;
}
