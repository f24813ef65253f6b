//! Marked-results CSV artifact.

use std::path::Path;

use anyhow::{Context, Result};

use vivamark_core::marking::MarkReport;

/// Render a score without a spurious fractional part, so integer
/// weights produce integer totals in the artifact.
fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        let mut s = format!("{score}");
        while s.contains('.') && s.ends_with('0') {
            s.pop();
        }
        s
    }
}

/// Write the marked-results artifact.
///
/// One row per candidate, ordered by candidate id, overwriting any
/// previous artifact at `path`.
pub fn write_marked_results(report: &MarkReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create marked results file {}", path.display()))?;
    writer.write_record(["candidateId", "totalScore"])?;
    for (candidate, score) in &report.scores {
        writer.write_record([candidate.as_str(), &format_score(*score)])?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write marked results to {}", path.display()))?;
    Ok(())
}
