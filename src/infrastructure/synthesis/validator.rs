use std::collections::HashSet;

use crate::domain::ports::{ResponseValidator, ValidationVerdict};
use crate::domain::RetrievalCandidate;
use crate::infrastructure::text::{token_set, tokens};

/// Accepts an answer when, for at least one grounding entry, the share of that entry's
/// answer tokens found in the generated answer reaches `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct OverlapValidator {
    threshold: f32,
}

impl OverlapValidator {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    fn overlap(answer_tokens: &HashSet<String>, source: &str) -> f32 {
        let source: HashSet<String> = tokens(source).collect();
        if source.is_empty() {
            return 0.0;
        }
        let shared = source.iter().filter(|t| answer_tokens.contains(*t)).count();
        shared as f32 / source.len() as f32
    }
}

impl ResponseValidator for OverlapValidator {
    fn validate(&self, answer: &str, grounding: &[RetrievalCandidate]) -> ValidationVerdict {
        let answer_tokens = token_set(answer);
        let score = grounding
            .iter()
            .map(|c| Self::overlap(&answer_tokens, &c.entry.answer))
            .fold(0.0f32, f32::max);

        ValidationVerdict {
            accepted: !grounding.is_empty() && score >= self.threshold,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategorySet, FaqEntry, FaqMetadata};

    fn grounding(answers: &[&str]) -> Vec<RetrievalCandidate> {
        let category = CategorySet::new(["account"]).unwrap().parse("account").unwrap();
        answers
            .iter()
            .enumerate()
            .map(|(i, a)| RetrievalCandidate {
                entry: FaqEntry {
                    id: i as u64 + 1,
                    question: "q".to_string(),
                    answer: a.to_string(),
                    category: category.clone(),
                    metadata: FaqMetadata::default(),
                },
                score: 0.5,
                rank: i + 1,
            })
            .collect()
    }

    #[test]
    fn test_best_entry_decides() {
        let validator = OverlapValidator::new(0.5);
        let g = grounding(&["Refunds take five days", "Go to settings > security"]);

        let verdict = validator.validate("Go into settings, then security.", &g);
        assert!(verdict.accepted);
        assert!((verdict.score - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_unrelated_answer_is_rejected() {
        let validator = OverlapValidator::new(0.5);
        let g = grounding(&["Go to settings > security"]);
        let verdict = validator.validate("Our office is closed on Sundays.", &g);
        assert!(!verdict.accepted);
        assert_eq!(verdict.score, 0.0);
    }

    #[test]
    fn test_no_grounding_never_accepts() {
        let verdict = OverlapValidator::new(0.0).validate("anything", &[]);
        assert!(!verdict.accepted);
    }
}
