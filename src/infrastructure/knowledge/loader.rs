use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{KnowledgeBase, KnowledgeSnapshot, SnapshotStore};
use crate::domain::ports::EmbeddingService;
use crate::domain::{CategorySet, DistanceMetric, DomainError, IndexRow};
use crate::infrastructure::config::KnowledgeConfig;
use crate::infrastructure::index::{codec, VectorIndex};

/// Produces [`KnowledgeSnapshot`]s from the configured dataset and persisted index.
pub struct SnapshotLoader {
    config: KnowledgeConfig,
    metric: DistanceMetric,
    categories: CategorySet,
    embedding: Arc<dyn EmbeddingService>,
}

impl SnapshotLoader {
    pub fn new(
        config: KnowledgeConfig,
        metric: DistanceMetric,
        categories: CategorySet,
        embedding: Arc<dyn EmbeddingService>,
    ) -> Self {
        Self {
            config,
            metric,
            categories,
            embedding,
        }
    }

    /// Loads the persisted index when present, otherwise builds (and persists) a new one.
    /// A persisted index from another embedding model is rebuilt when building is
    /// allowed and rejected otherwise. Every error from here is fatal for startup.
    #[instrument(skip(self), fields(faq_path = %self.config.faq_path.display()))]
    pub async fn load_or_build(&self) -> Result<KnowledgeSnapshot, DomainError> {
        let knowledge = KnowledgeBase::load(&self.config.faq_path, &self.categories)?;

        match self.config.index_path.as_deref().filter(|p| p.exists()) {
            Some(path) => {
                let codec::PersistedIndex {
                    index,
                    embedding_model,
                } = codec::load(path)?;
                if index.dimension() != self.embedding.dimension() {
                    return Err(DomainError::dimension_mismatch(
                        self.embedding.dimension(),
                        index.dimension(),
                    ));
                }
                if embedding_model != self.embedding.model_name() {
                    if !self.config.build_if_missing {
                        return Err(DomainError::corrupt(format!(
                            "persisted index was embedded with {embedding_model} but the provider is {}",
                            self.embedding.model_name()
                        )));
                    }
                    warn!(
                        persisted = %embedding_model,
                        configured = self.embedding.model_name(),
                        "persisted index was embedded by another model; rebuilding"
                    );
                    return self.build(knowledge).await;
                }
                if index.metric() != self.metric {
                    warn!(
                        persisted = index.metric().as_str(),
                        configured = self.metric.as_str(),
                        "persisted index uses a different metric; keeping the persisted one"
                    );
                }
                info!(
                    path = %path.display(),
                    rows = index.row_count(),
                    dimension = index.dimension(),
                    model = %embedding_model,
                    "loaded persisted index"
                );
                KnowledgeSnapshot::new(knowledge, index, embedding_model)
            }
            None if self.config.build_if_missing || self.config.index_path.is_none() => {
                self.build(knowledge).await
            }
            None => Err(DomainError::corrupt(
                "persisted index is missing and building is disabled",
            )),
        }
    }

    /// Rebuilds from the dataset, ignoring any persisted index, and installs the result.
    #[instrument(skip(self, store))]
    pub async fn reload(&self, store: &SnapshotStore) -> Result<Arc<KnowledgeSnapshot>, DomainError> {
        let knowledge = KnowledgeBase::load(&self.config.faq_path, &self.categories)?;
        let snapshot = self.build(knowledge).await?;
        store.swap(snapshot)?;
        store.current()
    }

    async fn build(&self, knowledge: KnowledgeBase) -> Result<KnowledgeSnapshot, DomainError> {
        let texts: Vec<String> = knowledge
            .entries()
            .iter()
            .map(|e| e.embedding_text())
            .collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        let embeddings = self.embedding.embed_many(&refs).await?;
        let rows = knowledge
            .entries()
            .iter()
            .zip(embeddings)
            .map(|(entry, embedding)| IndexRow::new(entry.id, embedding))
            .collect();
        let index = VectorIndex::build(rows, self.metric)?;

        info!(
            rows = index.row_count(),
            dimension = index.dimension(),
            metric = self.metric.as_str(),
            model = self.embedding.model_name(),
            "built index"
        );

        if let Some(path) = &self.config.index_path {
            codec::save(&index, self.embedding.model_name(), path)?;
            info!(path = %path.display(), "persisted index");
        }

        KnowledgeSnapshot::new(knowledge, index, self.embedding.model_name())
    }
}
