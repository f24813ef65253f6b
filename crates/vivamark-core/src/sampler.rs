//! Random question sampling.
//!
//! Draws a fixed-size, duplicate-free subset of the bank. The random
//! source is injected so identical draws are reproducible under test.

use rand::seq::index;
use rand::Rng;

use crate::bank::QuestionBank;
use crate::error::VivaError;
use crate::model::Question;

/// Draw `count` distinct questions from the bank, uniformly and without
/// replacement. Each call is an independent draw; there is no
/// cross-session deduplication.
pub fn sample_questions<R: Rng + ?Sized>(
    bank: &QuestionBank,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Question>, VivaError> {
    if bank.len() < count {
        return Err(VivaError::Validation(format!(
            "bank holds {} questions but {count} were requested",
            bank.len()
        )));
    }

    let all = bank.all();
    let picked = index::sample(rng, all.len(), count)
        .into_iter()
        .map(|i| all[i].clone())
        .collect();
    Ok(picked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn bank_of(n: usize) -> QuestionBank {
        let questions: Vec<String> = (0..n)
            .map(|i| {
                format!(
                    r#"{{"id": "Q{i}", "question": "prompt {i}", "options": {{"A": "x", "B": "y"}}, "answer": "A"}}"#
                )
            })
            .collect();
        let doc = format!(r#"{{"All": [{}]}}"#, questions.join(","));
        QuestionBank::from_json_str(&doc).unwrap()
    }

    #[test]
    fn draws_distinct_questions_from_the_bank() {
        let bank = bank_of(20);
        let mut rng = StdRng::seed_from_u64(7);
        let drawn = sample_questions(&bank, 5, &mut rng).unwrap();
        assert_eq!(drawn.len(), 5);

        let ids: HashSet<&str> = drawn.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids.len(), 5, "sampled ids must be distinct");
        for id in &ids {
            assert!(bank.get(id).is_some(), "sampled id {id} not in bank");
        }
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let bank = bank_of(20);
        let a = sample_questions(&bank, 5, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = sample_questions(&bank, 5, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn undersized_bank_is_a_validation_error() {
        let bank = bank_of(3);
        let err = sample_questions(&bank, 5, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, VivaError::Validation(_)));
    }

    #[test]
    fn full_bank_draw_returns_everything() {
        let bank = bank_of(4);
        let drawn = sample_questions(&bank, 4, &mut StdRng::seed_from_u64(1)).unwrap();
        let ids: HashSet<&str> = drawn.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
    }
}
