mod classifier;
mod embedding;
mod knowledge;
mod llm;
mod synthesis;

pub use classifier::Classifier;
pub use embedding::{
    check_batch_output, ensure_batch_embeddable, ensure_embeddable, EmbeddingService,
};
pub use knowledge::{KnowledgeSource, KnowledgeView};
pub use llm::LlmService;
pub use synthesis::{
    ResponseSynthesizer, ResponseValidator, Strictness, SynthesisRequest, ValidationVerdict,
};
