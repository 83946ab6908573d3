use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{LlmService, ResponseSynthesizer, Strictness, SynthesisRequest};
use crate::domain::DomainError;
use crate::infrastructure::config::ResponsePrompts;

pub struct LlmSynthesizer {
    llm: Arc<dyn LlmService>,
    system: String,
    strict_system: String,
}

impl LlmSynthesizer {
    pub fn new(llm: Arc<dyn LlmService>, prompts: &ResponsePrompts) -> Self {
        Self {
            llm,
            system: prompts.system.clone(),
            strict_system: prompts.strict_system.clone(),
        }
    }

    fn build_prompt(request: &SynthesisRequest<'_>) -> String {
        let mut prompt = format!(
            "Customer question: {}\nCategory: {}\n\nKnowledge base entries:\n",
            request.query, request.category
        );
        for (i, candidate) in request.grounding.iter().enumerate() {
            let _ = writeln!(
                prompt,
                "{}. Q: {}\n   A: {}",
                i + 1,
                candidate.entry.question,
                candidate.entry.answer
            );
        }
        prompt.push_str("\nWrite the reply to the customer.");
        prompt
    }
}

#[async_trait]
impl ResponseSynthesizer for LlmSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest<'_>) -> Result<String, DomainError> {
        if request.grounding.is_empty() {
            return Err(DomainError::retrieval_empty("nothing to synthesize from"));
        }

        let system = match request.strictness {
            Strictness::Standard => &self.system,
            Strictness::Strict => &self.strict_system,
        };
        let answer = self
            .llm
            .complete_with_system(system, &Self::build_prompt(&request))
            .await?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(DomainError::backend_unavailable("model returned an empty answer"));
        }
        Ok(answer.to_string())
    }
}
