//! Core types for the sleepwatch pipeline
//!
//! This module defines the data that flows through each stage of a run:
//! raw provider sleep sessions, trigger thresholds and decisions, and the
//! patient credentials that select between live and offline operation.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Session type label the provider puts on full overnight sleep records.
/// Naps and other session types do not count toward the nightly series.
pub const LONG_SLEEP: &str = "long_sleep";

/// Prefix the original config format uses to mean "no real token configured".
/// Recognized at parse time only; downstream code sees [`Credential::Unset`].
pub const PLACEHOLDER_PREFIX: &str = "xxx";

/// One raw sleep record as returned by the provider.
///
/// All fields are optional: provider payloads are parsed leniently and a
/// record missing what the normalizer needs is excluded, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepSession {
    /// Calendar date the session belongs to
    pub day: Option<NaiveDate>,
    /// Session category (e.g. "long_sleep", "sleep")
    #[serde(rename = "type")]
    pub session_type: Option<String>,
    /// Total sleep duration in seconds, present only on qualifying records
    pub total_sleep_duration: Option<f64>,
}

impl SleepSession {
    /// Attempt to read a session out of an arbitrary JSON value.
    ///
    /// Returns `None` for anything that is not a JSON object; unknown fields
    /// are ignored and missing fields become `None`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Whether this record contributes a night to the duration series.
    pub fn qualifies(&self) -> bool {
        self.session_type.as_deref() == Some(LONG_SLEEP) && self.total_sleep_duration.is_some()
    }
}

/// Trigger thresholds, threaded explicitly through every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Percent deviation from baseline above which a trigger fires
    pub deviation_pct: f64,
    /// Absolute floor: total sleep below this many hours always triggers
    pub min_hours: f64,
}

impl Thresholds {
    pub const DEFAULT_DEVIATION_PCT: f64 = 25.0;
    pub const DEFAULT_MIN_HOURS: f64 = 4.0;

    pub fn new(deviation_pct: f64, min_hours: f64) -> Self {
        Self {
            deviation_pct,
            min_hours,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DEVIATION_PCT, Self::DEFAULT_MIN_HOURS)
    }
}

/// Result of evaluating a nightly duration series against the thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDecision {
    /// Most recent night's total sleep (hours)
    pub last_night_hours: f64,
    /// Mean of the 7 nights preceding the last (hours)
    pub baseline_mean_hours: f64,
    /// Absolute deviation from baseline as a percentage; 0 when baseline is 0
    pub percent_change: f64,
    /// Whether an assessment should be dispatched
    pub triggered: bool,
}

/// A patient's provider access token, or the explicit absence of one.
///
/// `Unset` selects the bundled offline sample data and forces dry-run
/// dispatch, so a run with no real credentials never touches the network.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credential {
    Real(String),
    #[default]
    Unset,
}

impl Credential {
    /// Lift a raw config string into a tagged credential. Empty strings and
    /// the original format's "xxx" placeholder family mean "not configured".
    pub fn from_raw(raw: &str) -> Self {
        if raw.is_empty() || raw.starts_with(PLACEHOLDER_PREFIX) {
            Credential::Unset
        } else {
            Credential::Real(raw.to_string())
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Credential::Unset)
    }
}

// Tokens must never end up in logs or reports.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Real(_) => write!(f, "Real(****)"),
            Credential::Unset => write!(f, "Unset"),
        }
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Credential::from_raw(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_from_object() {
        let value = json!({
            "day": "2025-05-01",
            "type": "long_sleep",
            "total_sleep_duration": 25200,
            "bedtime_start": "2025-05-01T23:10:00+00:00"
        });

        let session = SleepSession::from_value(&value).unwrap();
        assert!(session.qualifies());
        assert_eq!(session.total_sleep_duration, Some(25200.0));
    }

    #[test]
    fn test_session_rejects_non_objects() {
        assert!(SleepSession::from_value(&json!("not a record")).is_none());
        assert!(SleepSession::from_value(&json!(42)).is_none());
        assert!(SleepSession::from_value(&json!(null)).is_none());
    }

    #[test]
    fn test_nap_does_not_qualify() {
        let nap = SleepSession::from_value(&json!({
            "day": "2025-05-01",
            "type": "sleep",
            "total_sleep_duration": 1800
        }))
        .unwrap();
        assert!(!nap.qualifies());

        let missing_duration = SleepSession::from_value(&json!({
            "day": "2025-05-01",
            "type": "long_sleep"
        }))
        .unwrap();
        assert!(!missing_duration.qualifies());
    }

    #[test]
    fn test_credential_placeholder_mapping() {
        assert!(Credential::from_raw("").is_unset());
        assert!(Credential::from_raw("xxx").is_unset());
        assert!(Credential::from_raw("xxx-not-a-token").is_unset());
        assert_eq!(
            Credential::from_raw("PAT.real-token"),
            Credential::Real("PAT.real-token".to_string())
        );
    }

    #[test]
    fn test_credential_debug_redacts_token() {
        let cred = Credential::Real("secret-token".to_string());
        let rendered = format!("{cred:?}");
        assert!(!rendered.contains("secret"));
    }
}
