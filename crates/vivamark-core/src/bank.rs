//! Question bank loader and validator.
//!
//! Loads the bank document, a JSON mapping of category name to an ordered
//! list of question objects, and flattens it into an id-indexed table.
//! The bank is read-only after load.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::error::VivaError;
use crate::model::Question;

/// Intermediate document structure. Categories carry no semantics past
/// load time; a BTreeMap keeps the flattening order deterministic.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct BankDocument {
    categories: BTreeMap<String, Vec<Question>>,
}

/// The flat, id-indexed question table.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
    by_id: HashMap<String, usize>,
}

impl QuestionBank {
    /// Load a bank from a JSON document file.
    pub fn load(path: &Path) -> Result<Self, VivaError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VivaError::DataFormat(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse a bank from a JSON string (useful for testing).
    pub fn from_json_str(content: &str) -> Result<Self, VivaError> {
        let document: BankDocument = serde_json::from_str(content)
            .map_err(|e| VivaError::DataFormat(e.to_string()))?;

        let mut questions = Vec::new();
        let mut by_id = HashMap::new();
        for question_list in document.categories.into_values() {
            for question in question_list {
                // Duplicate ids: the later entry wins the index slot, but
                // validate_bank flags it.
                by_id.insert(question.id.clone(), questions.len());
                questions.push(question);
            }
        }

        Ok(Self { questions, by_id })
    }

    /// Look up a question by id.
    pub fn get(&self, id: &str) -> Option<&Question> {
        self.by_id.get(id).map(|&i| &self.questions[i])
    }

    /// All questions in deterministic (category, then document) order.
    pub fn all(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// A non-fatal issue found in a loaded bank.
#[derive(Debug, Clone)]
pub struct BankWarning {
    /// The question id (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a loaded bank for common authoring mistakes.
pub fn validate_bank(bank: &QuestionBank) -> Vec<BankWarning> {
    let mut warnings = Vec::new();

    // Duplicate ids: the flat listing keeps every entry, so count them.
    let mut seen = std::collections::HashSet::new();
    for q in bank.all() {
        if !seen.insert(&q.id) {
            warnings.push(BankWarning {
                question_id: Some(q.id.clone()),
                message: format!("duplicate question id: {}", q.id),
            });
        }
    }

    for q in bank.all() {
        if q.options.is_empty() {
            warnings.push(BankWarning {
                question_id: Some(q.id.clone()),
                message: "question has no options".into(),
            });
        } else if !q.has_option(&q.answer) {
            warnings.push(BankWarning {
                question_id: Some(q.id.clone()),
                message: format!("answer key '{}' is not one of the option labels", q.answer),
            });
        }

        if q.question.trim().is_empty() {
            warnings.push(BankWarning {
                question_id: Some(q.id.clone()),
                message: "prompt text is empty".into(),
            });
        }
    }

    warnings
}
