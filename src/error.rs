//! Error types for projection runs

use thiserror::Error;

/// Failure of a whole engine run.
///
/// Per-row arithmetic never produces one of these: missing assumptions and
/// zero denominators are resolved to 0 where they occur. Only malformed
/// input and I/O surface here, and they abort the run as a unit.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("model point {id}: {reason}")]
    InvalidModelPoint { id: u32, reason: String },

    #[error("invalid target cohort years: {0}")]
    InvalidCohortYears(String),

    #[error("invalid assumption table {table}: {reason}")]
    InvalidTable { table: String, reason: String },

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("projection aborted: {0}")]
    Panicked(String),
}

impl EngineError {
    pub fn invalid_model_point(id: u32, reason: impl Into<String>) -> Self {
        EngineError::InvalidModelPoint {
            id,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
