//! Core error types.
//!
//! These error types represent failures in the session state machine and
//! the question bank loader. Defined in `vivamark-core` so callers can
//! classify errors for recovery decisions without string matching.

use thiserror::Error;

/// Errors surfaced by the session engine and bank loader.
#[derive(Debug, Error)]
pub enum VivaError {
    /// User-correctable input, rejected before any state change.
    #[error("validation error: {0}")]
    Validation(String),

    /// The question bank document is unparsable or incomplete. Fatal at
    /// load; no partial bank is ever used.
    #[error("question bank format error: {0}")]
    DataFormat(String),

    /// The result sink could not be reached at flush time. Session state
    /// is retained so the flush can be retried.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl VivaError {
    /// Returns `true` if the operation can be retried or corrected by
    /// the caller without restarting the process.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VivaError::Validation(_) | VivaError::Persistence(_)
        )
    }
}
