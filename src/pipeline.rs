//! Pipeline orchestration
//!
//! This module sequences one patient through ingestion, normalization,
//! trigger evaluation, and conditional dispatch, and runs that pipeline
//! over every configured patient. Patients are processed strictly one at a
//! time; an error scoped to one patient is recorded in the run report and
//! never aborts the others.

use crate::config::{AppConfig, PatientCredential};
use crate::dispatch::{DispatchOutcome, SurveyDispatcher};
use crate::error::PipelineError;
use crate::normalizer::SleepNormalizer;
use crate::providers::{BundledSample, OuraClient, SleepRecordSource};
use crate::trigger::TriggerEvaluator;
use crate::types::{Credential, Thresholds, TriggerDecision};
use std::fmt;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// Caller-facing knobs for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Simulate dispatch instead of contacting the survey provider
    pub dry_run: bool,
    pub thresholds: Thresholds,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            thresholds: Thresholds::default(),
        }
    }
}

/// Everything the pipeline decided for one patient.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientOutcome {
    pub decision: TriggerDecision,
    /// `None` when the trigger did not fire
    pub dispatch: Option<DispatchOutcome>,
}

impl fmt::Display for PatientOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.decision;
        if d.triggered {
            let mode = match &self.dispatch {
                Some(outcome) if outcome.dry_run => "invites simulated",
                Some(_) => "invites sent",
                None => "no dispatch recorded",
            };
            write!(
                f,
                "triggered (last {:.2} h, baseline {:.2} h, change {:.1}%) -> {mode}",
                d.last_night_hours, d.baseline_mean_hours, d.percent_change
            )
        } else {
            write!(
                f,
                "no trigger (last {:.2} h, baseline {:.2} h, change {:.1}%)",
                d.last_night_hours, d.baseline_mean_hours, d.percent_change
            )
        }
    }
}

/// Per-patient entry in the run report.
#[derive(Debug)]
pub struct PatientResult {
    pub patient_id: String,
    pub outcome: Result<PatientOutcome, PipelineError>,
}

/// One-shot EMA pipeline over the configured patients.
pub struct EmaPipeline {
    config: AppConfig,
    dispatcher: SurveyDispatcher,
    options: RunOptions,
    run_id: Uuid,
}

impl EmaPipeline {
    pub fn new(config: AppConfig, options: RunOptions) -> Result<Self, PipelineError> {
        let dispatcher = SurveyDispatcher::new(config.survey.clone())?;
        Ok(Self {
            config,
            dispatcher,
            options,
            run_id: Uuid::new_v4(),
        })
    }

    /// Process every configured patient once, in configuration order.
    ///
    /// Failures are isolated: each patient's error lands in their own
    /// [`PatientResult`] and the iteration continues.
    pub fn run_once(&self) -> Vec<PatientResult> {
        let span = info_span!("run", run_id = %self.run_id, dry_run = self.options.dry_run);
        let _guard = span.enter();

        self.config
            .patients
            .iter()
            .map(|patient| {
                info!(patient_id = %patient.patient_id, "processing patient");
                let outcome = self.run_for_patient(patient);
                if let Err(error) = &outcome {
                    warn!(patient_id = %patient.patient_id, %error, "patient processing failed");
                }
                PatientResult {
                    patient_id: patient.patient_id.clone(),
                    outcome,
                }
            })
            .collect()
    }

    /// Run the full pipeline for a single patient.
    pub fn run_for_patient(
        &self,
        patient: &PatientCredential,
    ) -> Result<PatientOutcome, PipelineError> {
        let source = source_for(&patient.credential)?;
        self.run_with_source(&patient.patient_id, source.as_ref())
    }

    /// Run the pipeline for one patient against an explicit record source.
    pub fn run_with_source(
        &self,
        patient_id: &str,
        source: &dyn SleepRecordSource,
    ) -> Result<PatientOutcome, PipelineError> {
        let records = source.fetch_records()?;
        let hours = SleepNormalizer::normalize(&records);
        let decision = TriggerEvaluator::evaluate(&hours, &self.options.thresholds)?;

        let baseline_nights = &hours[..hours.len() - 1];
        debug!(patient_id, ?baseline_nights);
        info!(
            patient_id,
            last_night_hours = format_args!("{:.2}", decision.last_night_hours),
            baseline_mean_hours = format_args!("{:.2}", decision.baseline_mean_hours),
            percent_change = format_args!("{:.2}", decision.percent_change),
            triggered = decision.triggered,
        );

        let dispatch = if decision.triggered {
            info!(patient_id, "trigger condition met, dispatching survey");
            Some(self.dispatcher.dispatch(patient_id, self.options.dry_run)?)
        } else {
            info!(patient_id, "no trigger for this patient");
            None
        };

        Ok(PatientOutcome { decision, dispatch })
    }
}

/// Pick the record source for a credential. An unset credential selects the
/// bundled sample dataset so the run never reaches for the network.
fn source_for(credential: &Credential) -> Result<Box<dyn SleepRecordSource>, PipelineError> {
    match credential {
        Credential::Unset => {
            info!("no provider credential configured, using bundled sample data (offline mode)");
            Ok(Box::new(BundledSample))
        }
        Credential::Real(token) => Ok(Box::new(OuraClient::new(token.clone())?)),
    }
}
