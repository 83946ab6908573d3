use serde::{Deserialize, Serialize};

use super::{Embedding, FaqEntry, FaqId};

/// One vector in the index, pointing at exactly one knowledge-base entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRow {
    pub entry_id: FaqId,
    pub embedding: Embedding,
}

impl IndexRow {
    pub fn new(entry_id: FaqId, embedding: Embedding) -> Self {
        Self {
            entry_id,
            embedding,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalCandidate {
    pub entry: FaqEntry,
    pub score: f32,
    /// 1-based position in the result list.
    pub rank: usize,
}

impl RetrievalCandidate {
    pub fn id(&self) -> FaqId {
        self.entry.id
    }
}
