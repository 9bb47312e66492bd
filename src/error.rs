//! Error types for the sprint report pipeline.

use thiserror::Error;

/// Errors raised while collecting, transforming or persisting sprint data.
#[derive(Debug, Error)]
pub enum SprintError {
    /// A raw record lacks a required field, or the field has the wrong type.
    #[error("raw record #{index} is malformed: field `{field}` {reason}")]
    InputMalformed {
        index: usize,
        field: &'static str,
        reason: &'static str,
    },

    /// The task tracker could not be reached or returned something unusable.
    #[error("task tracker unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Story point totals overflowed; the report could not be stored faithfully.
    #[error("sprint '{sprint}' has story points that are not finite numbers")]
    NonFinite { sprint: String },

    /// No report has been persisted yet.
    #[error("sprints report has not been generated yet")]
    ReportMissing,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SprintError {
    /// Shorthand for a missing required field.
    pub fn missing(index: usize, field: &'static str) -> Self {
        SprintError::InputMalformed {
            index,
            field,
            reason: "is missing",
        }
    }

    /// Shorthand for a field with an unexpected JSON type or value.
    pub fn invalid(index: usize, field: &'static str, reason: &'static str) -> Self {
        SprintError::InputMalformed {
            index,
            field,
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, SprintError>;
