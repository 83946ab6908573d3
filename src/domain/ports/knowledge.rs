use std::sync::Arc;

use crate::domain::{errors::DomainError, Category, Embedding, RetrievalCandidate};

/// One consistent, read-only view of the knowledge base and its index.
pub trait KnowledgeView: Send + Sync {
    /// Up to `k` candidates, best first, ranks starting at 1. A category that matches
    /// nothing yields an empty list.
    fn search(
        &self,
        vector: &Embedding,
        k: usize,
        category: Option<&Category>,
        min_similarity: f32,
    ) -> Result<Vec<RetrievalCandidate>, DomainError>;

    fn dimension(&self) -> usize;

    fn entry_count(&self) -> usize;
}

/// Hands out the live view. A query holds on to the view it was given for its whole run.
pub trait KnowledgeSource: Send + Sync {
    fn snapshot(&self) -> Result<Arc<dyn KnowledgeView>, DomainError>;
}
