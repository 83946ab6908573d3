use std::time::Duration;

use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::anthropic;

use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::config::LlmConfig;

const MAX_TOKENS: u64 = 1024;

/// Anthropic completions through rig. Reads `ANTHROPIC_API_KEY` from the environment.
pub struct AnthropicLlm {
    model: String,
    timeout: Duration,
}

impl AnthropicLlm {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.model.clone()).with_timeout(Duration::from_secs(config.timeout_seconds))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl LlmService for AnthropicLlm {
    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        let client = anthropic::Client::from_env();
        let agent = client
            .agent(&self.model)
            .max_tokens(MAX_TOKENS)
            .preamble(system)
            .build();

        tokio::time::timeout(self.timeout, agent.prompt(prompt))
            .await
            .map_err(|_| DomainError::backend_timeout("Anthropic completion timed out"))?
            .map_err(|e| DomainError::backend_unavailable(format!("Anthropic completion failed: {e}")))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
