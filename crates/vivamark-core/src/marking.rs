//! Offline marking engine.
//!
//! A batch pass over the entire persisted answer history. Every run
//! recomputes all totals from scratch; nothing here is incremental.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::bank::QuestionBank;
use crate::model::{AnswerRecord, QuestionStat, WeightTable};

/// The outcome of one marking run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReport {
    /// Candidate id to accumulated weighted score, ascending by id.
    pub scores: BTreeMap<String, f64>,
    /// Per-question tallies, in the order questions were first
    /// encountered in the history. Difficulty ranking relies on this
    /// order for stable ties.
    pub stats: Vec<QuestionStat>,
    /// Records skipped because their question id was absent from the
    /// bank.
    pub skipped: usize,
}

impl MarkReport {
    /// Look up the tally for a question id.
    pub fn stat(&self, question_id: &str) -> Option<&QuestionStat> {
        self.stats.iter().find(|s| s.question_id == question_id)
    }
}

/// Mark the full answer history against the bank and weight table.
///
/// A record whose question id is no longer in the bank is logged and
/// excluded from both scoring and statistics; the run continues. A
/// correct selection (case-insensitive label match) credits the
/// question's weight; everything else, the sentinel included, counts as
/// incorrect. Candidates appear in the score map even when nothing was
/// credited.
pub fn mark(records: &[AnswerRecord], bank: &QuestionBank, weights: &WeightTable) -> MarkReport {
    let mut scores: BTreeMap<String, f64> = BTreeMap::new();
    let mut stats: Vec<QuestionStat> = Vec::new();
    let mut stat_index: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(question) = bank.get(&record.question_id) else {
            tracing::warn!(
                question = %record.question_id,
                candidate = %record.candidate_id,
                "recorded question id not found in bank, skipping record"
            );
            skipped += 1;
            continue;
        };

        let score = scores.entry(record.candidate_id.clone()).or_insert(0.0);
        let index = *stat_index
            .entry(record.question_id.clone())
            .or_insert_with(|| {
                stats.push(QuestionStat {
                    question_id: record.question_id.clone(),
                    correct: 0,
                    incorrect: 0,
                });
                stats.len() - 1
            });

        if record.selected_option.matches(&question.answer) {
            *score += weights.weight(&record.question_id);
            stats[index].correct += 1;
        } else {
            stats[index].incorrect += 1;
        }
    }

    MarkReport {
        scores,
        stats,
        skipped,
    }
}
