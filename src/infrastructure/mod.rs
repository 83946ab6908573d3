pub mod classifier;
pub mod config;
pub mod embedding;
pub mod index;
pub mod knowledge;
pub mod llm;
pub mod synthesis;
pub mod text;
pub mod wiring;

pub use classifier::{KeywordClassifier, LlmClassifier};
pub use config::{AppConfig, Config, PromptsConfig};
pub use embedding::{HashingEmbedding, OpenAiEmbedding};
pub use index::VectorIndex;
pub use knowledge::{KnowledgeBase, KnowledgeSnapshot, SnapshotLoader, SnapshotStore};
pub use llm::AnthropicLlm;
pub use synthesis::{LlmSynthesizer, OverlapValidator, TemplateSynthesizer};
pub use wiring::{build_orchestrator, build_stack, SupportStack};
