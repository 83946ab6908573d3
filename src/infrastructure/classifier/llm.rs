use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::ports::{Classifier, LlmService};
use crate::domain::{CategoryScore, CategorySet, DomainError};

#[derive(Debug, Deserialize)]
struct LlmVerdict {
    category: String,
    confidence: f32,
}

/// Asks the language model to pick one configured category and rate its confidence.
pub struct LlmClassifier {
    llm: Arc<dyn LlmService>,
    categories: CategorySet,
    system_prompt: String,
}

impl LlmClassifier {
    /// `{categories}` in `system_prompt` is replaced with the configured names.
    pub fn new(llm: Arc<dyn LlmService>, categories: CategorySet, system_prompt: &str) -> Self {
        let system_prompt = system_prompt.replace("{categories}", &categories.names().join(", "));
        Self {
            llm,
            categories,
            system_prompt,
        }
    }

    fn parse(&self, raw: &str) -> Result<CategoryScore, DomainError> {
        let json = extract_object(raw).ok_or_else(|| {
            DomainError::backend_unavailable("classifier reply contained no JSON object")
        })?;
        let verdict: LlmVerdict = serde_json::from_str(json).map_err(|e| {
            DomainError::backend_unavailable(format!("unparseable classifier reply: {e}"))
        })?;

        let category = self.categories.parse(&verdict.category).ok_or_else(|| {
            DomainError::backend_unavailable(format!(
                "classifier chose unknown category '{}'",
                verdict.category
            ))
        })?;
        if !verdict.confidence.is_finite() {
            return Err(DomainError::backend_unavailable(
                "classifier confidence is not a number",
            ));
        }
        Ok(CategoryScore::new(category, verdict.confidence))
    }
}

/// The outermost `{...}` span, so replies wrapped in prose or code fences still parse.
fn extract_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn score(&self, text: &str) -> Result<Vec<CategoryScore>, DomainError> {
        let raw = self
            .llm
            .complete_with_system(&self.system_prompt, text)
            .await?;
        Ok(vec![self.parse(&raw)?])
    }

    fn name(&self) -> &str {
        "llm"
    }
}
