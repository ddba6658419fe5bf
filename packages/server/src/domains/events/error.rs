use thiserror::Error;

use super::validation::{BatchError, ValidationError};

/// Failure of a write operation.
///
/// Client faults (`Invalid`, `Batch`) never touch the store. Server faults
/// (`Cancelled`, `Store`) mean valid input could not be stored; their detail
/// is for logs, not for callers.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("storage error: {0}")]
    Store(#[from] sqlx::Error),
}

impl IngestError {
    /// True when the caller's input was at fault and a retry without changes
    /// will fail the same way.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, IngestError::Invalid(_) | IngestError::Batch(_))
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::Invalid(_) => "invalid_request",
            IngestError::Batch(BatchError::Invalid { .. }) => "invalid_event",
            IngestError::Batch(_) => "invalid_request",
            IngestError::Cancelled | IngestError::Store(_) => "insert_failed",
        }
    }
}
