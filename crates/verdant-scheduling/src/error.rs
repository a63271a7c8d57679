//! Error types for the scheduling core.

use thiserror::Error;
use uuid::Uuid;

/// Result alias for scheduling operations.
pub type Result<T> = std::result::Result<T, SchedulingError>;

/// Errors produced by the scheduling and escalation core.
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// A frequency value could not be interpreted. Fatal to the single
    /// calculation; never retried.
    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    /// A date computation produced no representable date.
    #[error("Date arithmetic failed for {0}")]
    DateOutOfRange(String),

    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Escalation workflow not found.
    #[error("Escalation workflow not found: {0}")]
    WorkflowNotFound(Uuid),

    /// Obligation not found.
    #[error("Obligation not found: {0}")]
    ObligationNotFound(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_frequency_display() {
        let err = SchedulingError::InvalidFrequency("fortnightly".to_string());
        assert_eq!(err.to_string(), "Invalid frequency: fortnightly");
    }
}
