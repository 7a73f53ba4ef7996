//! Sleepwatch - threshold-triggered EMA pipeline for nightly sleep deviation
//!
//! Sleepwatch ingests a patient's nightly sleep-duration history, detects an
//! anomalous deviation from the recent baseline, and dispatches a survey
//! invitation when one is found. The pipeline degrades safely at every
//! external boundary: patients without a real provider credential run
//! against a bundled offline dataset, and a placeholder survey token forces
//! dry-run dispatch.
//!
//! ## Pipeline stages
//!
//! raw records → nightly duration series → trigger decision → dispatch

pub mod config;
pub mod dispatch;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod providers;
pub mod trigger;
pub mod types;

pub use config::AppConfig;
pub use dispatch::{DispatchOutcome, SurveyDispatcher};
pub use error::PipelineError;
pub use normalizer::SleepNormalizer;
pub use pipeline::{EmaPipeline, PatientOutcome, PatientResult, RunOptions};
pub use trigger::{TriggerEvaluator, BASELINE_NIGHTS, WINDOW_NIGHTS};
pub use types::{Credential, SleepSession, Thresholds, TriggerDecision};

/// Crate version carried in run logs
pub const SLEEPWATCH_VERSION: &str = env!("CARGO_PKG_VERSION");
