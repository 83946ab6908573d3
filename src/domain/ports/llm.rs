use crate::domain::errors::DomainError;
use async_trait::async_trait;

/// Opaque text-generation backend. Calls may be slow or fail; callers own the timeout.
#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete_with_system(&self, system: &str, prompt: &str)
        -> Result<String, DomainError>;
    fn model_name(&self) -> &str;
}
