//! In-memory result sink for tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use vivamark_core::model::AnswerRecord;
use vivamark_core::traits::ResultSink;

/// A sink that keeps rows in memory and can be told to fail the next
/// append, for exercising flush retry paths.
#[derive(Default)]
pub struct MemorySink {
    rows: Mutex<Vec<AnswerRecord>>,
    append_calls: AtomicU32,
    fail_next: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `append` call return an error.
    pub fn fail_next_append(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn append_calls(&self) -> u32 {
        self.append_calls.load(Ordering::SeqCst)
    }

    pub fn rows(&self) -> Vec<AnswerRecord> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, rows: &[AnswerRecord]) -> anyhow::Result<()> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            anyhow::bail!("simulated sink failure");
        }
        self.rows.lock().unwrap().extend_from_slice(rows);
        Ok(())
    }

    async fn read_all(&self) -> anyhow::Result<Vec<AnswerRecord>> {
        Ok(self.rows())
    }
}
