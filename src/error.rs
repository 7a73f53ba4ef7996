//! Error types for sleepwatch

use thiserror::Error;

/// Errors that can occur while running the EMA pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("insufficient sleep history: have {have} nights, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("survey dispatch failed: {0}")]
    Dispatch(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Whether this error is fatal to the whole run rather than scoped to
    /// one patient. Shared-setup failures (configuration) abort everything;
    /// data and provider failures abort only the patient being processed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Config(_) | PipelineError::Io(_))
    }
}
