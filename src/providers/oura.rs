//! Oura sleep API client
//!
//! Fetches the trailing window of raw sleep sessions for one patient.
//! Single bearer-authenticated request with a bounded timeout; the
//! provider's raw ordering is not guaranteed, so records are sorted by day
//! before they are handed to the normalizer.

use crate::error::PipelineError;
use crate::trigger::WINDOW_NIGHTS;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tracing::debug;

use super::{SleepRecordSource, REQUEST_TIMEOUT_SECS};

const OURA_SLEEP_URL: &str = "https://api.ouraring.com/v2/usercollection/sleep";

/// Response envelope for the sleep collection endpoint
#[derive(Debug, Deserialize)]
struct SleepEnvelope {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// Client for the Oura sleep collection endpoint
pub struct OuraClient {
    client: reqwest::blocking::Client,
    token: String,
    window_days: i64,
}

impl OuraClient {
    /// Create a client fetching the default evaluation window.
    pub fn new(token: impl Into<String>) -> Result<Self, PipelineError> {
        Self::with_window_days(token, WINDOW_NIGHTS as i64)
    }

    /// Create a client fetching a trailing window of `window_days` days.
    pub fn with_window_days(
        token: impl Into<String>,
        window_days: i64,
    ) -> Result<Self, PipelineError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(StdDuration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            token: token.into(),
            window_days,
        })
    }
}

impl SleepRecordSource for OuraClient {
    fn fetch_records(&self) -> Result<Vec<serde_json::Value>, PipelineError> {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(self.window_days);
        debug!(%start, %end, "fetching sleep records");

        let envelope: SleepEnvelope = self
            .client
            .get(OURA_SLEEP_URL)
            .bearer_auth(&self.token)
            .query(&[
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        let mut records = envelope.data;
        sort_by_day(&mut records);
        Ok(records)
    }
}

/// Sort raw records chronologically. ISO calendar dates sort
/// lexicographically; records without a day field sort first.
fn sort_by_day(records: &mut [serde_json::Value]) {
    records.sort_by(|a, b| {
        let day_a = a.get("day").and_then(|d| d.as_str()).unwrap_or("");
        let day_b = b.get("day").and_then(|d| d.as_str()).unwrap_or("");
        day_a.cmp(day_b)
    });
}
