mod keyword;
mod llm;

pub use keyword::KeywordClassifier;
pub use llm::LlmClassifier;
