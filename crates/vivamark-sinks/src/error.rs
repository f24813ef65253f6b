//! Sink error types.
//!
//! These error types represent failures when talking to the remote
//! spreadsheet service, so callers can classify transport failures for
//! retry decisions without string matching.

use thiserror::Error;

/// Errors that can occur when interacting with a remote result sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The service returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid service credentials).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The configured spreadsheet does not exist.
    #[error("spreadsheet not found: {0}")]
    SpreadsheetNotFound(String),

    /// The service returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl SinkError {
    /// Returns `true` if this error is permanent and should not be
    /// retried as-is.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            SinkError::AuthenticationFailed(_) | SinkError::SpreadsheetNotFound(_)
        )
    }
}
