//! Local CSV file sink.
//!
//! Appends finalized rows to a flat file with the header written exactly
//! once, and reads the full accumulated history back for marking.

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;

use vivamark_core::model::AnswerRecord;
use vivamark_core::traits::ResultSink;

/// Append-only CSV result sink.
///
/// The file grows across sessions and process restarts; rows are never
/// rewritten.
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn needs_header(&self) -> bool {
        match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        }
    }
}

#[async_trait]
impl ResultSink for CsvFileSink {
    fn name(&self) -> &str {
        "csv"
    }

    async fn append(&self, rows: &[AnswerRecord]) -> anyhow::Result<()> {
        let write_header = self.needs_header();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open results file {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        for row in rows {
            writer.serialize(row)?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to write results to {}", self.path.display()))?;
        Ok(())
    }

    async fn read_all(&self) -> anyhow::Result<Vec<AnswerRecord>> {
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("failed to read results file {}", self.path.display()))?;
        let mut reader = csv::Reader::from_reader(file);
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let row: AnswerRecord = record
                .with_context(|| format!("malformed row in {}", self.path.display()))?;
            rows.push(row);
        }
        Ok(rows)
    }
}
