//! Bundled offline sample dataset
//!
//! When a patient has no real credential configured, the pipeline reads
//! this embedded dataset instead of calling the provider, so a checkout
//! with no secrets still produces a full run. The file is loaded verbatim:
//! it ships already in chronological order and is not re-sorted.

use crate::error::PipelineError;
use serde::Deserialize;

use super::SleepRecordSource;

const SAMPLE_JSON: &str = include_str!("../../data/sample_sleep.json");

#[derive(Debug, Deserialize)]
struct SampleEnvelope {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// Offline source backed by the embedded sample file
pub struct BundledSample;

impl SleepRecordSource for BundledSample {
    fn fetch_records(&self) -> Result<Vec<serde_json::Value>, PipelineError> {
        let envelope: SampleEnvelope = serde_json::from_str(SAMPLE_JSON)?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::SleepNormalizer;
    use crate::trigger::WINDOW_NIGHTS;

    #[test]
    fn test_sample_parses_and_covers_a_full_window() {
        let records = BundledSample.fetch_records().unwrap();
        assert!(!records.is_empty());

        let hours = SleepNormalizer::normalize(&records);
        assert_eq!(hours.len(), WINDOW_NIGHTS);
    }

    #[test]
    fn test_sample_last_night_is_anomalous() {
        // The shipped dataset demonstrates a triggering run: a short last
        // night against an ordinary week.
        let records = BundledSample.fetch_records().unwrap();
        let hours = SleepNormalizer::normalize(&records);

        let last = *hours.last().unwrap();
        assert!(last < 4.0, "sample last night should sit under the floor");
    }
}
