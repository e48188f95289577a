//! # AppError
//!
//! Centralized error handling for the post engine.
//! Every engine operation returns one of these classifications; none of
//! them is retried by the engine itself.

use crate::ids::InvalidIdError;
use thiserror::Error;

/// The primary error type for all engine operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// An identifier could not be decoded (distinct from a missing document)
    #[error(transparent)]
    InvalidId(#[from] InvalidIdError),

    /// The document an operation needs to act on does not exist
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// A write affected zero documents (lost race or concurrent delete)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The acting user does not own the post or comment
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Transport or driver failure reported by the document store
    #[error("document store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("operation canceled")]
    Canceled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl AppError {
    /// Whether repeating the same call may succeed without any other change.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }
}

/// A specialized Result type for engine logic.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_id_converts_and_keeps_message() {
        let err: AppError = "xyz".parse::<crate::PostId>().unwrap_err().into();
        assert!(matches!(err, AppError::InvalidId(_)));
        assert_eq!(err.to_string(), "\"xyz\" is not a valid post identifier");
    }

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(AppError::Conflict("lost race".into()).is_retryable());
        assert!(!AppError::NotFound("post", "00".into()).is_retryable());
        assert!(!AppError::Store(anyhow::anyhow!("socket closed")).is_retryable());
        assert!(!AppError::DeadlineExceeded.is_retryable());
    }
}
