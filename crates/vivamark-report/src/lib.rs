//! vivamark-report — Report generation for vivamark.
//!
//! Renders marking output into its two consumer-facing forms: the
//! marked-results CSV artifact and the question difficulty report.

pub mod difficulty;
pub mod marked;

pub use difficulty::render_difficulty_report;
pub use marked::write_marked_results;
