//! Deviation trigger evaluation
//!
//! Pure decision logic: given the last 8 normalized nightly durations,
//! decide whether an assessment should be dispatched. Two independent
//! conditions are OR-ed: an absolute floor (too little sleep regardless of
//! baseline) and a relative deviation from the 7-night baseline mean.

use crate::error::PipelineError;
use crate::types::{Thresholds, TriggerDecision};

/// Nights of history that form the baseline.
pub const BASELINE_NIGHTS: usize = 7;

/// Nights required for an evaluation: the baseline plus the current night.
pub const WINDOW_NIGHTS: usize = BASELINE_NIGHTS + 1;

/// Evaluator for the sleep-deviation trigger rule
pub struct TriggerEvaluator;

impl TriggerEvaluator {
    /// Evaluate a nightly duration series (hours, oldest to newest).
    ///
    /// Fails with [`PipelineError::InsufficientData`] when the series holds
    /// fewer than [`WINDOW_NIGHTS`] entries; the baseline requires exactly
    /// seven prior nights plus the current one. A zero baseline yields a
    /// percent change of 0 rather than a division by zero.
    pub fn evaluate(
        series: &[f64],
        thresholds: &Thresholds,
    ) -> Result<TriggerDecision, PipelineError> {
        if series.len() < WINDOW_NIGHTS {
            return Err(PipelineError::InsufficientData {
                have: series.len(),
                need: WINDOW_NIGHTS,
            });
        }

        let last_night_hours = series[series.len() - 1];
        let baseline = &series[..series.len() - 1];
        let baseline_mean_hours = baseline.iter().sum::<f64>() / baseline.len() as f64;

        let percent_change = if baseline_mean_hours > 0.0 {
            (last_night_hours - baseline_mean_hours).abs() / baseline_mean_hours * 100.0
        } else {
            0.0
        };

        let triggered =
            last_night_hours < thresholds.min_hours || percent_change > thresholds.deviation_pct;

        Ok(TriggerDecision {
            last_night_hours,
            baseline_mean_hours,
            percent_change,
            triggered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn test_absolute_floor_breached() {
        let series = [7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 3.5];
        let decision = TriggerEvaluator::evaluate(&series, &defaults()).unwrap();

        assert!(decision.triggered);
        assert_eq!(decision.last_night_hours, 3.5);
        assert_eq!(decision.baseline_mean_hours, 7.0);
        // 3.5 vs 7.0 also breaches the deviation threshold, but the floor
        // alone is sufficient
        assert!(decision.last_night_hours < defaults().min_hours);
    }

    #[test]
    fn test_relative_deviation_breached() {
        let series = [7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 9.5];
        let decision = TriggerEvaluator::evaluate(&series, &defaults()).unwrap();

        assert!(decision.triggered);
        assert_eq!(decision.baseline_mean_hours, 7.0);
        // (9.5 - 7.0) / 7.0 * 100 ~= 35.7%
        assert!((decision.percent_change - 35.714).abs() < 0.01);
        // Above the floor, so only the deviation condition fired
        assert!(decision.last_night_hours >= defaults().min_hours);
    }

    #[test]
    fn test_ordinary_night_does_not_trigger() {
        let series = [7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.2];
        let decision = TriggerEvaluator::evaluate(&series, &defaults()).unwrap();

        assert!(!decision.triggered);
        assert!((decision.percent_change - 2.857).abs() < 0.01);
    }

    #[test]
    fn test_insufficient_nights_is_an_error() {
        let series = [7.0, 6.5, 7.2, 8.0, 7.1];
        let err = TriggerEvaluator::evaluate(&series, &defaults()).unwrap_err();

        match err {
            PipelineError::InsufficientData { have, need } => {
                assert_eq!(have, 5);
                assert_eq!(need, 8);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_baseline_defines_percent_change_as_zero() {
        let series = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 6.0];
        let decision = TriggerEvaluator::evaluate(&series, &defaults()).unwrap();

        assert_eq!(decision.percent_change, 0.0);
        // 6.0 is above the floor and the deviation is defined as 0
        assert!(!decision.triggered);
    }

    #[test]
    fn test_floor_triggers_independently_of_percent_change() {
        // Baseline low enough that the last night deviates by less than the
        // threshold, yet still sits under the absolute floor.
        let series = [4.2, 4.2, 4.2, 4.2, 4.2, 4.2, 4.2, 3.9];
        let decision = TriggerEvaluator::evaluate(&series, &defaults()).unwrap();

        assert!(decision.percent_change < defaults().deviation_pct);
        assert!(decision.triggered);
    }

    #[test]
    fn test_monotonic_in_last_night() {
        // Holding the baseline fixed, every value below the floor triggers.
        let baseline = [7.0; 7];
        for last in [3.99, 3.0, 2.0, 1.0, 0.0] {
            let mut series = baseline.to_vec();
            series.push(last);
            let decision = TriggerEvaluator::evaluate(&series, &defaults()).unwrap();
            assert!(decision.triggered, "last night {last} h should trigger");
        }
    }
}
