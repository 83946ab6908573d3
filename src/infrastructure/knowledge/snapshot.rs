use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use super::KnowledgeBase;
use crate::domain::ports::{KnowledgeSource, KnowledgeView};
use crate::domain::{Category, DomainError, Embedding, RetrievalCandidate};
use crate::infrastructure::index::VectorIndex;

/// A knowledge base and the index built from it, checked to be row-aligned.
/// Never mutated once constructed.
#[derive(Debug)]
pub struct KnowledgeSnapshot {
    knowledge: KnowledgeBase,
    index: VectorIndex,
    embedding_model: String,
    loaded_at: DateTime<Utc>,
}

impl KnowledgeSnapshot {
    pub fn new(
        knowledge: KnowledgeBase,
        index: VectorIndex,
        embedding_model: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if knowledge.len() != index.row_count() {
            return Err(DomainError::corrupt(format!(
                "knowledge base has {} entries but the index has {} rows",
                knowledge.len(),
                index.row_count()
            )));
        }
        for (pos, (entry, row)) in knowledge.entries().iter().zip(index.rows()).enumerate() {
            if entry.id != row.entry_id {
                return Err(DomainError::corrupt(format!(
                    "index row {pos} references entry {} but entry {} is at that position",
                    row.entry_id, entry.id
                )));
            }
        }

        Ok(Self {
            knowledge,
            index,
            embedding_model: embedding_model.into(),
            loaded_at: Utc::now(),
        })
    }

    /// Up to `k` candidates scoring strictly above `min_similarity`, restricted to
    /// `category` when given. Ranks start at 1.
    pub fn query(
        &self,
        vector: &Embedding,
        k: usize,
        category: Option<&Category>,
        min_similarity: f32,
    ) -> Result<Vec<RetrievalCandidate>, DomainError> {
        let entries = self.knowledge.entries();
        let scored = match category {
            Some(category) => self.index.search(vector, k, |id| {
                self.knowledge
                    .position(id)
                    .is_some_and(|pos| &entries[pos].category == category)
            })?,
            None => self.index.search(vector, k, |_| true)?,
        };

        Ok(scored
            .into_iter()
            .filter(|row| row.score > min_similarity)
            .enumerate()
            .map(|(i, row)| RetrievalCandidate {
                entry: entries[row.position].clone(),
                score: row.score,
                rank: i + 1,
            })
            .collect())
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl KnowledgeView for KnowledgeSnapshot {
    fn search(
        &self,
        vector: &Embedding,
        k: usize,
        category: Option<&Category>,
        min_similarity: f32,
    ) -> Result<Vec<RetrievalCandidate>, DomainError> {
        self.query(vector, k, category, min_similarity)
    }

    fn dimension(&self) -> usize {
        self.index.dimension()
    }

    fn entry_count(&self) -> usize {
        self.knowledge.len()
    }
}

/// Holds the live snapshot. Readers take an `Arc` and drop the lock immediately;
/// `swap` replaces the whole snapshot, leaving in-flight readers on the old one.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<KnowledgeSnapshot>>,
}

impl SnapshotStore {
    pub fn new(snapshot: KnowledgeSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn current(&self) -> Result<Arc<KnowledgeSnapshot>, DomainError> {
        self.current
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|e| DomainError::internal(e.to_string()))
    }

    /// Installs `snapshot` and returns the one it replaced.
    pub fn swap(&self, snapshot: KnowledgeSnapshot) -> Result<Arc<KnowledgeSnapshot>, DomainError> {
        let mut guard = self
            .current
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        Ok(std::mem::replace(&mut *guard, Arc::new(snapshot)))
    }
}

impl KnowledgeSource for SnapshotStore {
    fn snapshot(&self) -> Result<Arc<dyn KnowledgeView>, DomainError> {
        let current: Arc<dyn KnowledgeView> = self.current()?;
        Ok(current)
    }
}
