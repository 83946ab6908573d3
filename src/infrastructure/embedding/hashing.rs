use async_trait::async_trait;

use crate::domain::ports::{
    check_batch_output, ensure_batch_embeddable, ensure_embeddable, EmbeddingService,
};
use crate::domain::{DomainError, Embedding};
use crate::infrastructure::text::tokens;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
pub const MIN_DIMENSION: usize = 8;

/// Local bag-of-words embedding: FNV-1a hashed tokens folded into `dimension` buckets,
/// L2-normalised. Deterministic and dependency-free, so it backs tests and offline runs.
///
/// `dimension` must be at least [`MIN_DIMENSION`]; configuration validation rejects
/// anything smaller.
#[derive(Debug, Clone)]
pub struct HashingEmbedding {
    dimension: usize,
    model: String,
}

impl HashingEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model: format!("hashing-fnv1a-{dimension}"),
        }
    }

    fn bucket(&self, token: &str) -> usize {
        let mut h = FNV_OFFSET;
        for b in token.as_bytes() {
            h ^= u64::from(*b);
            h = h.wrapping_mul(FNV_PRIME);
        }
        (h % self.dimension as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Embedding {
        let mut v = vec![0.0f32; self.dimension];
        for token in tokens(text) {
            v[self.bucket(&token)] += 1.0;
        }
        Embedding::new(v).normalized()
    }
}

impl Default for HashingEmbedding {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl EmbeddingService for HashingEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        ensure_embeddable(text)?;
        Ok(self.vectorize(text))
    }

    async fn embed_many(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        ensure_batch_embeddable(texts)?;
        let embeddings: Vec<Embedding> = texts.iter().map(|t| self.vectorize(t)).collect();
        check_batch_output(texts.len(), self.dimension, &embeddings)?;
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
