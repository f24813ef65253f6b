//! Question difficulty ranking.
//!
//! Consumes the per-question tallies from a marking run and orders
//! questions hardest-first by observed correct-rate.

use serde::{Deserialize, Serialize};

use crate::model::QuestionStat;

/// One ranked question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyEntry {
    /// Question identifier.
    pub question_id: String,
    /// Attempts that matched the answer key.
    pub correct: u32,
    /// Attempts that did not.
    pub incorrect: u32,
    /// correct / (correct + incorrect), in [0, 1].
    pub correct_rate: f64,
}

impl DifficultyEntry {
    /// Total recorded attempts.
    pub fn attempts(&self) -> u32 {
        self.correct + self.incorrect
    }
}

/// Rank questions ascending by correct-rate (hardest first). Questions
/// with zero attempts are omitted, so the rate never divides by zero.
/// Ties keep the input order (stable sort), i.e. first-encountered wins.
pub fn rank_by_difficulty(stats: &[QuestionStat]) -> Vec<DifficultyEntry> {
    let mut entries: Vec<DifficultyEntry> = stats
        .iter()
        .filter(|s| s.attempts() > 0)
        .map(|s| DifficultyEntry {
            question_id: s.question_id.clone(),
            correct: s.correct,
            incorrect: s.incorrect,
            correct_rate: f64::from(s.correct) / f64::from(s.attempts()),
        })
        .collect();

    entries.sort_by(|a, b| {
        a.correct_rate
            .partial_cmp(&b.correct_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}
