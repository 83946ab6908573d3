use crate::domain::{errors::DomainError, Category, RetrievalCandidate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    Standard,
    /// Used on retry after a rejected answer: stay as close to the grounding as possible.
    Strict,
}

#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub query: &'a str,
    pub category: &'a Category,
    pub grounding: &'a [RetrievalCandidate],
    pub strictness: Strictness,
}

#[async_trait]
pub trait ResponseSynthesizer: Send + Sync {
    async fn synthesize(&self, request: SynthesisRequest<'_>) -> Result<String, DomainError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationVerdict {
    pub accepted: bool,
    pub score: f32,
}

pub trait ResponseValidator: Send + Sync {
    fn validate(&self, answer: &str, grounding: &[RetrievalCandidate]) -> ValidationVerdict;
}
