use async_trait::async_trait;

use crate::domain::ports::Classifier;
use crate::domain::{Category, CategoryScore, CategorySet, DomainError};
use crate::infrastructure::config::CategoryConfig;
use crate::infrastructure::text::{contains_phrase, tokens};

/// Counts keyword phrase hits per category.
///
/// A category with `hits` matches out of `total` across all categories scores
/// `hits / total × (1 − 0.5^hits)`, so a lone keyword never scores above 0.5 and a
/// category sharing hits with others is discounted.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<(Category, Vec<Vec<String>>)>,
}

impl KeywordClassifier {
    /// Categories named in `keywords` must belong to `categories`.
    pub fn new(categories: &CategorySet, keywords: &[CategoryConfig]) -> Result<Self, DomainError> {
        let mut rules = Vec::with_capacity(keywords.len());
        for entry in keywords {
            let category = categories
                .parse(&entry.name)
                .filter(|c| !c.is_uncategorized())
                .ok_or_else(|| {
                    DomainError::config(format!("keywords given for unknown category '{}'", entry.name))
                })?;
            let phrases = entry
                .keywords
                .iter()
                .map(|k| tokens(k).collect::<Vec<_>>())
                .filter(|p| !p.is_empty())
                .collect();
            rules.push((category, phrases));
        }
        Ok(Self { rules })
    }

    fn rank(&self, text: &str) -> Vec<CategoryScore> {
        let query: Vec<String> = tokens(text).collect();

        let hits: Vec<(&Category, usize)> = self
            .rules
            .iter()
            .map(|(category, phrases)| {
                let n = phrases.iter().filter(|p| contains_phrase(&query, p)).count();
                (category, n)
            })
            .filter(|(_, n)| *n > 0)
            .collect();

        let total: usize = hits.iter().map(|(_, n)| n).sum();
        if total == 0 {
            return Vec::new();
        }

        let mut ranked: Vec<CategoryScore> = hits
            .into_iter()
            .map(|(category, n)| {
                let share = n as f32 / total as f32;
                let support = 1.0 - 0.5f32.powi(n as i32);
                CategoryScore::new(category.clone(), share * support)
            })
            .collect();

        // Stable sort: ties keep configuration order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn score(&self, text: &str) -> Result<Vec<CategoryScore>, DomainError> {
        Ok(self.rank(text))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::AppConfig;

    fn classifier() -> KeywordClassifier {
        let app = AppConfig::default();
        KeywordClassifier::new(
            &app.category_set().unwrap(),
            &app.config.classification.categories,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_password_change_is_account() {
        let ranked = classifier()
            .score("how do I change my password")
            .await
            .unwrap();

        assert_eq!(ranked[0].category.as_str(), "account");
        assert!((ranked[0].score - 0.75).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_single_hit_scores_half() {
        let ranked = classifier().score("where is my invoice").await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].category.as_str(), "billing");
        assert!((ranked[0].score - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_split_hits_share_confidence() {
        let ranked = classifier()
            .score("my package tracking shows an error")
            .await
            .unwrap();

        assert_eq!(ranked[0].category.as_str(), "shipping");
        assert_eq!(ranked[1].category.as_str(), "technical");
        // shipping: 2/3 × 0.75, technical: 1/3 × 0.5
        assert!((ranked[0].score - 0.5).abs() < 1e-6);
        assert!((ranked[1].score - (1.0 / 6.0)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_no_hits_yields_nothing() {
        let ranked = classifier().score("¿Dónde está mi pedido?").await.unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_rejects_keywords_for_unknown_category() {
        let categories = CategorySet::new(["billing"]).unwrap();
        let keywords = vec![CategoryConfig {
            name: "shipping".to_string(),
            keywords: vec!["parcel".to_string()],
        }];
        assert!(KeywordClassifier::new(&categories, &keywords).is_err());
    }
}
