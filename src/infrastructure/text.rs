//! Tokenization shared by the local embedding, the keyword classifier and the
//! grounding validator.

use std::collections::HashSet;

/// Lowercase alphanumeric tokens, in order.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

pub fn token_set(text: &str) -> HashSet<String> {
    tokens(text).collect()
}

/// Whether `phrase` occurs in `haystack` as a run of whole tokens.
pub fn contains_phrase(haystack: &[String], phrase: &[String]) -> bool {
    if phrase.is_empty() || phrase.len() > haystack.len() {
        return false;
    }
    haystack.windows(phrase.len()).any(|w| w == phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_split_on_punctuation() {
        let t: Vec<String> = tokens("Go to Settings > Security!").collect();
        assert_eq!(t, vec!["go", "to", "settings", "security"]);
    }

    #[test]
    fn test_phrase_matches_whole_tokens_only() {
        let hay: Vec<String> = tokens("I was charged twice, cancel order please").collect();
        let cancel_order: Vec<String> = tokens("cancel order").collect();
        let charge: Vec<String> = tokens("charge").collect();
        assert!(contains_phrase(&hay, &cancel_order));
        assert!(!contains_phrase(&hay, &charge));
    }
}
