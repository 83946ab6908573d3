use serde::{Deserialize, Serialize};

use super::{Category, Diagnostic};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub score: f32,
}

impl CategoryScore {
    pub fn new(category: Category, score: f32) -> Self {
        Self {
            category,
            score: score.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Category used downstream; `uncategorized` when confidence fell below the threshold.
    pub category: Category,
    /// Score of the raw top category, reported even when it was overridden.
    pub confidence: f32,
    pub raw_category: Option<Category>,
    pub alternatives: Vec<CategoryScore>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ClassificationResult {
    /// Gates a ranked score list against `threshold`.
    pub fn from_ranked(mut ranked: Vec<CategoryScore>, threshold: f32) -> Self {
        if ranked.is_empty() {
            return Self::uncategorized();
        }

        let top = ranked.remove(0);
        let category = if top.score < threshold || top.category.is_uncategorized() {
            Category::uncategorized()
        } else {
            top.category.clone()
        };

        Self {
            category,
            confidence: top.score,
            raw_category: Some(top.category),
            alternatives: ranked,
            diagnostics: Vec::new(),
        }
    }

    pub fn uncategorized() -> Self {
        Self {
            category: Category::uncategorized(),
            confidence: 0.0,
            raw_category: None,
            alternatives: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}
