//! Error types for quota accounting

use thiserror::Error;

/// Result type for quota operations
pub type QuotaResult<T> = Result<T, QuotaError>;

/// Quota errors
///
/// Being over a limit is never an error: the ledger records reality and
/// classifies it as state the caller inspects. Errors here are inputs the
/// ledger refuses to act on at all, or storage failures underneath it.
#[derive(Debug, Error)]
pub enum QuotaError {
    /// Invalid input, rejected before any mutation
    #[error("Invalid quota input: {0}")]
    Validation(String),

    /// Storage backend failure
    #[error("Quota storage error: {0}")]
    Storage(String),
}

impl QuotaError {
    /// Create a validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(
            QuotaError::validation("empty tenant id"),
            QuotaError::Validation(_)
        ));
        assert!(matches!(
            QuotaError::storage("row lock lost"),
            QuotaError::Storage(_)
        ));
    }

    #[test]
    fn test_display() {
        let err = QuotaError::validation("resource type must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid quota input: resource type must not be empty"
        );
    }
}
