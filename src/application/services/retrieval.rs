use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::domain::{
    ports::{EmbeddingService, KnowledgeSource},
    Category, DomainError, Embedding, RetrievalCandidate,
};

/// Embeds the query and searches the live knowledge snapshot.
pub struct RetrievalAgent {
    embedding: Arc<dyn EmbeddingService>,
    knowledge: Arc<dyn KnowledgeSource>,
    min_similarity: f32,
    timeout: Duration,
}

impl RetrievalAgent {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        knowledge: Arc<dyn KnowledgeSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            embedding,
            knowledge,
            min_similarity: 0.0,
            timeout,
        }
    }

    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Filter, then widen: searches within `category` first (unless it is
    /// `uncategorized`) and tops up from an unfiltered search when that yields fewer
    /// than `k`. Filtered hits keep their place; ids never repeat.
    #[instrument(skip(self, query, category), fields(category = %category))]
    pub async fn retrieve(
        &self,
        query: &str,
        category: &Category,
        k: usize,
    ) -> Result<Vec<RetrievalCandidate>, DomainError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embed(query).await?;
        let snapshot = self.knowledge.snapshot()?;

        if category.is_uncategorized() {
            return snapshot.search(&vector, k, None, self.min_similarity);
        }

        let filtered = snapshot.search(&vector, k, Some(category), self.min_similarity)?;
        if filtered.len() >= k {
            return Ok(filtered);
        }

        let widened = snapshot.search(&vector, k, None, self.min_similarity)?;
        debug!(
            filtered = filtered.len(),
            widened = widened.len(),
            "widening retrieval beyond category"
        );
        Ok(merge(filtered, widened, k))
    }

    async fn embed(&self, query: &str) -> Result<Embedding, DomainError> {
        tokio::time::timeout(self.timeout, self.embedding.embed(query))
            .await
            .map_err(|_| {
                DomainError::backend_timeout(format!(
                    "embedding exceeded {:?}",
                    self.timeout
                ))
            })?
    }
}

fn merge(
    preferred: Vec<RetrievalCandidate>,
    rest: Vec<RetrievalCandidate>,
    k: usize,
) -> Vec<RetrievalCandidate> {
    let mut seen = HashSet::new();
    preferred
        .into_iter()
        .chain(rest)
        .filter(|c| seen.insert(c.id()))
        .take(k)
        .enumerate()
        .map(|(i, c)| RetrievalCandidate { rank: i + 1, ..c })
        .collect()
}
