//! Sleep record normalization
//!
//! This module turns a provider's heterogeneous session records into the
//! ordered nightly duration series the trigger rule consumes:
//! - only full overnight ("long_sleep") records with a duration count
//! - seconds converted to hours
//! - truncated to the trailing evaluation window

use crate::trigger::WINDOW_NIGHTS;
use crate::types::SleepSession;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Normalizer for converting raw provider records to nightly totals
pub struct SleepNormalizer;

impl SleepNormalizer {
    /// Produce nightly total-sleep hours, oldest to newest.
    ///
    /// Input order is preserved; callers are responsible for sorting live
    /// provider responses by day first. Records that are not JSON objects,
    /// are not "long_sleep" sessions, or lack a duration are excluded
    /// rather than treated as errors. Only the most recent
    /// [`WINDOW_NIGHTS`] entries are retained; a shorter result is returned
    /// unchanged and left for the evaluator to reject.
    pub fn normalize(records: &[serde_json::Value]) -> Vec<f64> {
        let mut hours: Vec<f64> = records
            .iter()
            .filter_map(SleepSession::from_value)
            .filter(SleepSession::qualifies)
            .filter_map(|session| session.total_sleep_duration)
            .map(|seconds| seconds / SECONDS_PER_HOUR)
            .collect();

        if hours.len() > WINDOW_NIGHTS {
            hours.drain(..hours.len() - WINDOW_NIGHTS);
        }
        hours
    }
}
