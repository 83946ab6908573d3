mod llm;
mod template;
mod validator;

pub use llm::LlmSynthesizer;
pub use template::TemplateSynthesizer;
pub use validator::OverlapValidator;
