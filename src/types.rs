//! Shared error types for Questline
//!
//! Every fallible operation returns a typed error; nothing is caught and
//! mapped to an empty default, so callers can tell "no progress yet" apart
//! from a failed operation.

use thiserror::Error;

/// Error types for quest progress operations
#[derive(Debug, Error)]
pub enum QuestlineError {
    /// No progress document or objective state matches the request
    #[error("Not found: {0}")]
    NotFound(String),

    /// Claim attempted before the objective completed
    #[error("Objective not completed: {0}")]
    NotCompleted(String),

    /// The objective's reward was already claimed
    #[error("Reward already claimed: {0}")]
    AlreadyClaimed(String),

    /// An atomic update lost its version race; the caller should reload and retry
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// The objective catalog collaborator failed
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// The progress store collaborator failed, or retries were exhausted
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Database connection or bootstrap failure
    #[error("Database error: {0}")]
    Database(String),
}

/// Convenience result type for Questline operations
pub type Result<T> = std::result::Result<T, QuestlineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QuestlineError::AlreadyClaimed("obj-1".into());
        assert_eq!(err.to_string(), "Reward already claimed: obj-1");

        let err = QuestlineError::PreconditionFailed("version 3".into());
        assert!(err.to_string().contains("Precondition failed"));
    }
}
