//! Question difficulty report.

use vivamark_core::bank::QuestionBank;
use vivamark_core::difficulty::DifficultyEntry;

/// Render the difficulty report as plain text, hardest question first.
///
/// Entries are expected in ascending correct-rate order, as produced by
/// `rank_by_difficulty`. Question prompts are looked up in the bank;
/// ids no longer present render as `N/A`.
pub fn render_difficulty_report(entries: &[DifficultyEntry], bank: &QuestionBank) -> String {
    let mut out = String::new();
    out.push_str("# Question difficulty (hardest first)\n\n");

    if entries.is_empty() {
        out.push_str("No attempted questions in the result history.\n");
        return out;
    }

    for (i, entry) in entries.iter().enumerate() {
        let prompt = bank
            .get(&entry.question_id)
            .map(|q| q.question.as_str())
            .unwrap_or("N/A");
        out.push_str(&format!(
            "{}. [{}] {}\n   correct: {}/{} ({:.1}%)\n",
            i + 1,
            entry.question_id,
            prompt,
            entry.correct,
            entry.attempts(),
            entry.correct_rate * 100.0
        ));
    }
    out
}
