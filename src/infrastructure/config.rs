use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{CategorySet, DistanceMetric, DomainError, UNCATEGORIZED};
use crate::infrastructure::embedding::MIN_DIMENSION;

const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";
const DEFAULT_PROMPTS_PATH: &str = "config/prompts.yaml";

/// Runtime settings plus prompt texts, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl AppConfig {
    /// Reads the files named by `SUPPORT_CONFIG` / `SUPPORT_PROMPTS` (or the defaults under
    /// `config/`), applies environment overrides and validates the result.
    pub fn load() -> Result<Self, DomainError> {
        let config_path =
            std::env::var("SUPPORT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let prompts_path =
            std::env::var("SUPPORT_PROMPTS").unwrap_or_else(|_| DEFAULT_PROMPTS_PATH.into());

        let mut app = Self::from_files(Path::new(&config_path), Path::new(&prompts_path))?;
        app.apply_env_overrides()?;
        app.validate()?;
        Ok(app)
    }

    pub fn from_files(config_path: &Path, prompts_path: &Path) -> Result<Self, DomainError> {
        let config_yaml = read_to_string(config_path)?;
        let prompts_yaml = read_to_string(prompts_path)?;
        Self::from_yaml(&config_yaml, &prompts_yaml)
    }

    pub fn from_yaml(config_yaml: &str, prompts_yaml: &str) -> Result<Self, DomainError> {
        let config: Config = serde_yaml::from_str(config_yaml)
            .map_err(|e| DomainError::config(format!("invalid config: {e}")))?;
        let prompts: PromptsConfig = serde_yaml::from_str(prompts_yaml)
            .map_err(|e| DomainError::config(format!("invalid prompts: {e}")))?;
        Ok(Self { config, prompts })
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), DomainError> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.config.server.host = host;
        }
        if let Ok(port) = std::env::var("SERVER_PORT") {
            self.config.server.port = port
                .parse()
                .map_err(|_| DomainError::config(format!("SERVER_PORT is not a port: {port}")))?;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.config.llm.model = model;
        }
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            self.config.embedding.provider = match provider.to_lowercase().as_str() {
                "hashing" => EmbeddingProvider::Hashing,
                "openai" => EmbeddingProvider::Openai,
                other => {
                    return Err(DomainError::config(format!(
                        "EMBEDDING_PROVIDER must be hashing or openai, got {other}"
                    )))
                }
            };
        }
        Ok(())
    }

    /// Checks every section and reports all violations at once.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Vec::new();
        let c = &self.config;

        if !(0.0..=1.0).contains(&c.classification.threshold) {
            errors.push(format!(
                "classification.threshold must be within [0, 1], got {}",
                c.classification.threshold
            ));
        }
        if !(0.0..=1.0).contains(&c.response.validation_threshold) {
            errors.push(format!(
                "response.validation_threshold must be within [0, 1], got {}",
                c.response.validation_threshold
            ));
        }
        if c.retrieval.top_k == 0 {
            errors.push("retrieval.top_k must be greater than 0".to_string());
        }
        if c.response.max_attempts == 0 {
            errors.push("response.max_attempts must be greater than 0".to_string());
        }
        if c.response.grounding_limit == 0 {
            errors.push("response.grounding_limit must be greater than 0".to_string());
        }
        if c.embedding.dimension < MIN_DIMENSION {
            errors.push(format!(
                "embedding.dimension must be at least {MIN_DIMENSION}, got {}",
                c.embedding.dimension
            ));
        }
        if c.pipeline.max_query_chars == 0 {
            errors.push("pipeline.max_query_chars must be greater than 0".to_string());
        }

        if c.classification.categories.is_empty() {
            errors.push("classification.categories must not be empty".to_string());
        }
        let mut seen = HashSet::new();
        for category in &c.classification.categories {
            let name = category.name.trim().to_lowercase();
            if name.is_empty() {
                errors.push("classification.categories contains an empty name".to_string());
            } else if name == UNCATEGORIZED {
                errors.push(format!(
                    "classification.categories: '{UNCATEGORIZED}' is reserved"
                ));
            } else if !seen.insert(name.clone()) {
                errors.push(format!(
                    "classification.categories: duplicate category '{name}'"
                ));
            }
        }

        let llm_enabled = c.llm.provider != LlmProvider::None;
        if c.classification.provider == ClassifierProvider::Llm && !llm_enabled {
            errors.push("classification.provider = llm requires an llm.provider".to_string());
        }
        if c.response.synthesizer == SynthesizerKind::Llm && !llm_enabled {
            errors.push("response.synthesizer = llm requires an llm.provider".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::config(errors.join("; ")))
        }
    }

    pub fn category_set(&self) -> Result<CategorySet, DomainError> {
        CategorySet::new(
            self.config
                .classification
                .categories
                .iter()
                .map(|c| c.name.as_str()),
        )
    }
}

fn read_to_string(path: &Path) -> Result<String, DomainError> {
    std::fs::read_to_string(path)
        .map_err(|e| DomainError::config(format!("cannot read {}: {e}", path.display())))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub knowledge: KnowledgeConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub llm: LlmConfig,
    pub classification: ClassificationConfig,
    pub retrieval: RetrievalConfig,
    pub response: ResponseConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub faq_path: PathBuf,
    /// Where the built index is persisted. `None` keeps it in memory only.
    pub index_path: Option<PathBuf>,
    pub build_if_missing: bool,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            faq_path: PathBuf::from("data/faq_dataset.json"),
            index_path: Some(PathBuf::from("data/faq.index")),
            build_if_missing: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    #[default]
    Hashing,
    Openai,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub timeout_ms: u64,
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashing,
            model: "text-embedding-3-small".to_string(),
            dimension: 384,
            timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub metric: DistanceMetric,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[default]
    None,
    Anthropic,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::None,
            model: "claude-3-5-haiku-latest".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierProvider {
    #[default]
    Keyword,
    Llm,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CategoryConfig {
    fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub provider: ClassifierProvider,
    /// Confidence below this maps the query to `uncategorized`.
    pub threshold: f32,
    pub timeout_ms: u64,
    pub categories: Vec<CategoryConfig>,
}

impl ClassificationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            provider: ClassifierProvider::Keyword,
            threshold: 0.5,
            timeout_ms: 3_000,
            categories: default_categories(),
        }
    }
}

fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new(
            "billing",
            &["charge", "charged", "payment", "credit card", "bill", "invoice"],
        ),
        CategoryConfig::new(
            "technical",
            &["login", "website", "error", "crash", "bug", "not working"],
        ),
        CategoryConfig::new(
            "account",
            &["account", "password", "profile", "email", "address", "settings", "change"],
        ),
        CategoryConfig::new(
            "shipping",
            &["delivery", "shipping", "tracking", "package", "arrived", "when will"],
        ),
        CategoryConfig::new(
            "refund",
            &["return", "refund", "money back", "exchange", "cancel order"],
        ),
        CategoryConfig::new(
            "product",
            &["size", "color", "material", "specification", "details", "available"],
        ),
        CategoryConfig::new(
            "general",
            &["help", "support", "question", "info", "hours", "contact"],
        ),
    ]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Candidates scoring at or below this are discarded.
    pub min_similarity: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_similarity: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesizerKind {
    #[default]
    Template,
    Llm,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    pub synthesizer: SynthesizerKind,
    pub max_attempts: u32,
    pub validation_threshold: f32,
    /// Candidates handed to the synthesizer.
    pub grounding_limit: usize,
    pub timeout_ms: u64,
}

impl ResponseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            synthesizer: SynthesizerKind::Template,
            max_attempts: 2,
            validation_threshold: 0.5,
            grounding_limit: 3,
            timeout_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_query_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_query_chars: 2_000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub classification: ClassificationPrompts,
    pub response: ResponsePrompts,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassificationPrompts {
    /// `{categories}` is replaced with the comma-separated category names.
    pub system: String,
}

impl Default for ClassificationPrompts {
    fn default() -> Self {
        Self {
            system: "You classify customer support queries. Choose exactly one category from: \
                     {categories}. Reply with JSON only: \
                     {\"category\": \"<name>\", \"confidence\": <number between 0 and 1>}."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResponsePrompts {
    pub system: String,
    pub strict_system: String,
    /// Returned verbatim when retrieval finds no grounding.
    pub fallback: String,
    pub greeting: String,
    pub closing: String,
    pub category_context: BTreeMap<String, String>,
}

impl Default for ResponsePrompts {
    fn default() -> Self {
        let category_context = [
            ("billing", "I can help you with your billing inquiry."),
            ("technical", "I see you're experiencing a technical issue."),
            ("account", "I can assist you with your account."),
            ("shipping", "I'll help you with your shipping question."),
            ("refund", "I understand you have a question about returns or refunds."),
            ("product", "I'm happy to provide product information."),
            ("general", "I'm here to help with your inquiry."),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            system: "You are a customer support assistant. Answer the customer using only the \
                     numbered knowledge base entries provided. Be concise and friendly."
                .to_string(),
            strict_system: "You are a customer support assistant. Answer using only sentences \
                            taken from the numbered knowledge base entries provided. Do not add \
                            any information that is not in those entries."
                .to_string(),
            fallback: "Thank you for contacting our support team. I don't have specific \
                       information about your question, but our customer service team is \
                       available to provide personalized assistance. Please contact them with \
                       your specific needs."
                .to_string(),
            greeting: "Thank you for contacting our support team.".to_string(),
            closing: "If you have any additional questions or need further assistance, please \
                      don't hesitate to reach out to our customer support team."
                .to_string(),
            category_context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let app = AppConfig::default();
        app.validate().unwrap();
        assert_eq!(app.category_set().unwrap().len(), 7);
        assert_eq!(app.config.retrieval.top_k, 3);
        assert_eq!(app.config.response.max_attempts, 2);
        assert_eq!(app.config.index.metric, DistanceMetric::Cosine);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
server:
  port: 9000
index:
  metric: dot_product
classification:
  threshold: 0.7
  categories:
    - name: billing
      keywords: [invoice]
"#;
        let app = AppConfig::from_yaml(yaml, "{}").unwrap();
        assert_eq!(app.config.server.port, 9000);
        assert_eq!(app.config.server.host, "0.0.0.0");
        assert_eq!(app.config.index.metric, DistanceMetric::DotProduct);
        assert_eq!(app.config.classification.categories.len(), 1);
        assert!((app.config.classification.threshold - 0.7).abs() < f32::EPSILON);
        assert!(!app.prompts.response.fallback.is_empty());
    }

    #[test]
    fn test_validate_collects_every_violation() {
        let mut app = AppConfig::default();
        app.config.classification.threshold = 1.5;
        app.config.retrieval.top_k = 0;
        app.config.response.max_attempts = 0;
        app.config.response.synthesizer = SynthesizerKind::Llm;
        app.config
            .classification
            .categories
            .push(CategoryConfig::new("Uncategorized", &[]));
        app.config
            .classification
            .categories
            .push(CategoryConfig::new("billing", &[]));

        let Err(DomainError::Config(msg)) = app.validate() else {
            panic!("expected a config error");
        };
        assert!(msg.contains("classification.threshold"));
        assert!(msg.contains("retrieval.top_k"));
        assert!(msg.contains("response.max_attempts"));
        assert!(msg.contains("requires an llm.provider"));
        assert!(msg.contains("reserved"));
        assert!(msg.contains("duplicate category 'billing'"));
    }

    #[test]
    fn test_small_embedding_dimension_is_rejected() {
        let mut app = AppConfig::default();
        app.config.embedding.dimension = 4;
        let Err(DomainError::Config(msg)) = app.validate() else {
            panic!("expected a config error");
        };
        assert!(msg.contains("embedding.dimension must be at least 8, got 4"));

        app.config.embedding.dimension = 8;
        app.validate().unwrap();
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        assert!(matches!(
            AppConfig::from_yaml("server: [", "{}"),
            Err(DomainError::Config(_))
        ));
    }
}
