//! The `vivamark mark` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use vivamark_core::bank::QuestionBank;
use vivamark_core::difficulty::rank_by_difficulty;
use vivamark_core::marking::mark;
use vivamark_report::{render_difficulty_report, write_marked_results};
use vivamark_sinks::{create_sink, load_config_from};

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank = QuestionBank::load(&config.bank_path)
        .with_context(|| format!("failed to load question bank {}", config.bank_path.display()))?;
    let weights = config.weight_table()?;
    let sink = create_sink(&config.sink)?;

    let records = sink.read_all().await?;
    if records.is_empty() {
        println!("No answer history found in the {} sink.", sink.name());
        return Ok(());
    }

    let report = mark(&records, &bank, &weights);
    write_marked_results(&report, &config.marked_output)?;
    println!(
        "Marked {} records from {} candidates -> {}",
        records.len() - report.skipped,
        report.scores.len(),
        config.marked_output.display()
    );
    if report.skipped > 0 {
        println!(
            "Skipped {} record(s) whose question id is no longer in the bank.",
            report.skipped
        );
    }

    let mut table = Table::new();
    table.set_header(vec!["Candidate", "Total score"]);
    for (candidate, score) in &report.scores {
        table.add_row(vec![Cell::new(candidate), Cell::new(format!("{score}"))]);
    }
    println!("\n{table}");

    let ranked = rank_by_difficulty(&report.stats);
    println!("\n{}", render_difficulty_report(&ranked, &bank));

    Ok(())
}
