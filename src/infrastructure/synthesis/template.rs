use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::ports::{ResponseSynthesizer, Strictness, SynthesisRequest};
use crate::domain::DomainError;
use crate::infrastructure::config::ResponsePrompts;

/// Wraps the best grounding answer in a greeting, a per-category line and a closing.
#[derive(Debug, Clone)]
pub struct TemplateSynthesizer {
    greeting: String,
    closing: String,
    category_context: BTreeMap<String, String>,
}

impl TemplateSynthesizer {
    pub fn new(prompts: &ResponsePrompts) -> Self {
        Self {
            greeting: prompts.greeting.clone(),
            closing: prompts.closing.clone(),
            category_context: prompts.category_context.clone(),
        }
    }
}

#[async_trait]
impl ResponseSynthesizer for TemplateSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest<'_>) -> Result<String, DomainError> {
        let top = request
            .grounding
            .first()
            .ok_or_else(|| DomainError::retrieval_empty("nothing to synthesize from"))?;

        let parts: Vec<&str> = match request.strictness {
            Strictness::Standard => {
                let context = self
                    .category_context
                    .get(request.category.as_str())
                    .map(String::as_str)
                    .unwrap_or_default();
                vec![
                    self.greeting.as_str(),
                    context,
                    top.entry.answer.as_str(),
                    self.closing.as_str(),
                ]
            }
            Strictness::Strict => vec![self.greeting.as_str(), top.entry.answer.as_str()],
        };

        Ok(parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }
}
