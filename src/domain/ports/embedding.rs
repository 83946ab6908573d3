use crate::domain::{errors::DomainError, Embedding};
use async_trait::async_trait;

/// Maps text to fixed-dimension vectors. Implementations are deterministic for a given
/// model version and must keep `embed_many` atomic: one bad item fails the batch.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError>;
    async fn embed_many(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError>;
    fn dimension(&self) -> usize;
    fn model_name(&self) -> &str;
}

pub fn ensure_embeddable(text: &str) -> Result<(), DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::invalid_input("cannot embed empty text"));
    }
    Ok(())
}

/// Validates every item up front so no backend call is made for a batch that would fail.
pub fn ensure_batch_embeddable(texts: &[&str]) -> Result<(), DomainError> {
    if let Some(pos) = texts.iter().position(|t| t.trim().is_empty()) {
        return Err(DomainError::invalid_input(format!(
            "batch item {pos} is empty; the batch was rejected"
        )));
    }
    Ok(())
}

/// Checks a backend's output against the request: same count, each vector of `dimension`.
pub fn check_batch_output(
    requested: usize,
    dimension: usize,
    embeddings: &[Embedding],
) -> Result<(), DomainError> {
    if embeddings.len() != requested {
        return Err(DomainError::backend_unavailable(format!(
            "embedding backend returned {} vectors for {} inputs",
            embeddings.len(),
            requested
        )));
    }
    for embedding in embeddings {
        if embedding.dimension() != dimension {
            return Err(DomainError::dimension_mismatch(
                dimension,
                embedding.dimension(),
            ));
        }
    }
    Ok(())
}
