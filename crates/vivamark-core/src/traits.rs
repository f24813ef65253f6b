//! Core trait definitions for answer persistence.
//!
//! The session engine and the marking engine depend only on this
//! capability set; concrete backends live in the `vivamark-sinks` crate.

use async_trait::async_trait;

use crate::model::AnswerRecord;

/// Append-only persistence target for finalized answer rows.
///
/// `append` is invoked at most once per completed session by the engine's
/// idempotency guard, but implementations should tolerate being retried
/// by the caller after a reported failure.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Human-readable backend name (e.g. "csv").
    fn name(&self) -> &str;

    /// Append finalized rows to the history.
    async fn append(&self, rows: &[AnswerRecord]) -> anyhow::Result<()>;

    /// Read the entire accumulated history, all candidates and sessions.
    async fn read_all(&self) -> anyhow::Result<Vec<AnswerRecord>>;
}
