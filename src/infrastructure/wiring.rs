use std::sync::Arc;

use tracing::info;

use crate::application::{
    ClassificationAgent, Orchestrator, OrchestratorSettings, ResponseAgent, ResponsePolicy,
    RetrievalAgent,
};
use crate::domain::ports::{
    Classifier, EmbeddingService, KnowledgeSource, LlmService, ResponseSynthesizer,
};
use crate::domain::{CategorySet, DomainError};
use crate::infrastructure::classifier::{KeywordClassifier, LlmClassifier};
use crate::infrastructure::config::{
    AppConfig, ClassifierProvider, EmbeddingProvider, LlmProvider, SynthesizerKind,
};
use crate::infrastructure::embedding::{HashingEmbedding, OpenAiEmbedding};
use crate::infrastructure::knowledge::{SnapshotLoader, SnapshotStore};
use crate::infrastructure::llm::AnthropicLlm;
use crate::infrastructure::synthesis::{LlmSynthesizer, OverlapValidator, TemplateSynthesizer};

/// Everything a binary needs, constructed once at startup.
pub struct SupportStack {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<SnapshotStore>,
    pub loader: Arc<SnapshotLoader>,
    pub categories: CategorySet,
}

/// Loads (or builds) the knowledge snapshot and assembles the pipeline. Any error is
/// fatal for startup.
pub async fn build_stack(app: &AppConfig) -> Result<SupportStack, DomainError> {
    app.validate()?;
    let categories = app.category_set()?;
    let embedding = build_embedding(app);
    let llm = build_llm(app);

    let loader = Arc::new(SnapshotLoader::new(
        app.config.knowledge.clone(),
        app.config.index.metric,
        categories.clone(),
        embedding.clone(),
    ));
    let snapshot = loader.load_or_build().await?;
    info!(
        entries = snapshot.knowledge().len(),
        dimension = snapshot.dimension(),
        model = snapshot.embedding_model(),
        "knowledge snapshot ready"
    );
    let store = Arc::new(SnapshotStore::new(snapshot));

    let orchestrator = build_orchestrator(app, &categories, embedding, store.clone(), llm)?;

    Ok(SupportStack {
        orchestrator: Arc::new(orchestrator),
        store,
        loader,
        categories,
    })
}

pub fn build_embedding(app: &AppConfig) -> Arc<dyn EmbeddingService> {
    let config = &app.config.embedding;
    match config.provider {
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedding::new(config.dimension)),
        EmbeddingProvider::Openai => Arc::new(OpenAiEmbedding::from_config(config)),
    }
}

pub fn build_llm(app: &AppConfig) -> Option<Arc<dyn LlmService>> {
    match app.config.llm.provider {
        LlmProvider::None => None,
        LlmProvider::Anthropic => {
            let llm: Arc<dyn LlmService> = Arc::new(AnthropicLlm::from_config(&app.config.llm));
            Some(llm)
        }
    }
}

/// Assembles the agents from configuration around the given providers.
pub fn build_orchestrator(
    app: &AppConfig,
    categories: &CategorySet,
    embedding: Arc<dyn EmbeddingService>,
    knowledge: Arc<dyn KnowledgeSource>,
    llm: Option<Arc<dyn LlmService>>,
) -> Result<Orchestrator, DomainError> {
    let c = &app.config;
    let prompts = &app.prompts;

    let keyword: Arc<dyn Classifier> = Arc::new(KeywordClassifier::new(
        categories,
        &c.classification.categories,
    )?);
    let classification = match (c.classification.provider, llm.clone()) {
        (ClassifierProvider::Llm, Some(llm)) => {
            let primary = Arc::new(LlmClassifier::new(
                llm,
                categories.clone(),
                &prompts.classification.system,
            ));
            ClassificationAgent::new(primary, c.classification.threshold, c.classification.timeout())
                .with_fallback(keyword)
        }
        (ClassifierProvider::Llm, None) => {
            return Err(DomainError::config(
                "classification.provider = llm requires an llm.provider",
            ))
        }
        (ClassifierProvider::Keyword, _) => ClassificationAgent::new(
            keyword,
            c.classification.threshold,
            c.classification.timeout(),
        ),
    };

    let retrieval = RetrievalAgent::new(embedding, knowledge, c.embedding.timeout())
        .with_min_similarity(c.retrieval.min_similarity);

    let synthesizer: Arc<dyn ResponseSynthesizer> = match (c.response.synthesizer, llm) {
        (SynthesizerKind::Llm, Some(llm)) => Arc::new(LlmSynthesizer::new(llm, &prompts.response)),
        (SynthesizerKind::Llm, None) => {
            return Err(DomainError::config(
                "response.synthesizer = llm requires an llm.provider",
            ))
        }
        (SynthesizerKind::Template, _) => Arc::new(TemplateSynthesizer::new(&prompts.response)),
    };
    let response = ResponseAgent::new(
        synthesizer,
        Arc::new(OverlapValidator::new(c.response.validation_threshold)),
        ResponsePolicy {
            max_attempts: c.response.max_attempts,
            grounding_limit: c.response.grounding_limit,
            timeout: c.response.timeout(),
            fallback_text: prompts.response.fallback.clone(),
        },
    );

    Ok(Orchestrator::new(
        classification,
        retrieval,
        response,
        OrchestratorSettings {
            top_k: c.retrieval.top_k,
            max_query_chars: c.pipeline.max_query_chars,
        },
    ))
}
