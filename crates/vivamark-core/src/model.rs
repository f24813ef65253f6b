//! Core data model types for vivamark.
//!
//! These are the fundamental types that the entire vivamark system uses
//! to represent questions, recorded answers, and scoring inputs.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VivaError;

/// The wire literal recorded when an answer slot was never filled.
pub const NOT_ANSWERED: &str = "not answered";

/// A single viva question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier for this question (e.g. "A1").
    pub id: String,
    /// The prompt text shown to the candidate.
    pub question: String,
    /// Option label (e.g. "A".."D") to option text.
    pub options: BTreeMap<String, String>,
    /// The label of the correct option.
    pub answer: String,
}

impl Question {
    /// Returns `true` if `label` names one of this question's options,
    /// ignoring case.
    pub fn has_option(&self, label: &str) -> bool {
        self.options
            .keys()
            .any(|k| k.eq_ignore_ascii_case(label))
    }

    /// Returns `true` if `label` is this question's correct answer,
    /// ignoring case.
    pub fn is_correct(&self, label: &str) -> bool {
        self.answer.eq_ignore_ascii_case(label)
    }
}

/// A candidate's selection for one question.
///
/// The persisted wire format is `"option <lowercase-label>"` for a filled
/// slot and the literal `"not answered"` for an empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A chosen option label, stored uppercase.
    Answered(String),
    /// The slot was never filled before the session completed.
    NotAnswered,
}

impl Selection {
    /// Build a selection from an option label.
    pub fn answered(label: &str) -> Self {
        Selection::Answered(label.to_ascii_uppercase())
    }

    /// Returns `true` if this selection matches the given answer key,
    /// ignoring case. The sentinel never matches anything.
    pub fn matches(&self, answer_key: &str) -> bool {
        match self {
            Selection::Answered(label) => label.eq_ignore_ascii_case(answer_key),
            Selection::NotAnswered => false,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Answered(label) => {
                write!(f, "option {}", label.to_ascii_lowercase())
            }
            Selection::NotAnswered => f.write_str(NOT_ANSWERED),
        }
    }
}

impl FromStr for Selection {
    type Err = std::convert::Infallible;

    /// Parse the wire format back into a selection. Parsing is total:
    /// anything that is not the sentinel is normalized by taking the last
    /// whitespace-separated token as the label, uppercased, so both
    /// `"option c"` and a bare `"c"` compare equal to an answer key `"C"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(NOT_ANSWERED) {
            return Ok(Selection::NotAnswered);
        }
        let label = trimmed
            .rsplit(char::is_whitespace)
            .next()
            .unwrap_or(trimmed);
        Ok(Selection::answered(label))
    }
}

impl Serialize for Selection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Selection {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        // FromStr is infallible
        Ok(s.parse().unwrap())
    }
}

/// One persisted answer row. Append-only: exactly one row per sampled
/// question per completed session, never mutated after write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    /// The candidate this row belongs to.
    pub candidate_id: String,
    /// The question that was sampled.
    pub question_id: String,
    /// The recorded selection (or the sentinel).
    pub selected_option: Selection,
}

/// Point values per question. Lookups are total: an id absent from the
/// table is worth the default weight of 1.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    weights: HashMap<String, f64>,
}

impl WeightTable {
    /// Build a weight table, rejecting non-positive weights.
    pub fn new(weights: HashMap<String, f64>) -> Result<Self, VivaError> {
        for (id, w) in &weights {
            if *w <= 0.0 || !w.is_finite() {
                return Err(VivaError::Validation(format!(
                    "weight for question '{id}' must be a positive number, got {w}"
                )));
            }
        }
        Ok(Self { weights })
    }

    /// The weight credited for answering `question_id` correctly.
    pub fn weight(&self, question_id: &str) -> f64 {
        self.weights.get(question_id).copied().unwrap_or(1.0)
    }
}

/// Per-question correct/incorrect tallies over the full answer history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionStat {
    /// Question identifier.
    pub question_id: String,
    /// Attempts that matched the answer key.
    pub correct: u32,
    /// Attempts that did not, including the sentinel.
    pub incorrect: u32,
}

impl QuestionStat {
    /// Total recorded attempts for this question.
    pub fn attempts(&self) -> u32 {
        self.correct + self.incorrect
    }
}
