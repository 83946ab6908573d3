use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, ClassificationResult, Diagnostic, FaqId, RetrievalCandidate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// A synthesized answer passed grounding validation.
    Accepted,
    /// No grounding was available; the fixed fallback message was returned.
    Rejected,
    /// Synthesis never validated; the best candidate's stored answer was returned verbatim.
    FallbackToSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    pub classification_ms: u64,
    pub retrieval_ms: u64,
    pub response_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportResponse {
    pub query_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    pub answer: String,
    pub category: Category,
    pub classification: ClassificationResult,
    pub grounding: Vec<RetrievalCandidate>,
    pub validation: ValidationStatus,
    pub synthesis_attempts: u32,
    pub quality: QualityReport,
    pub diagnostics: Vec<Diagnostic>,
    pub timings: StageTimings,
    pub responded_at: DateTime<Utc>,
}

impl SupportResponse {
    pub fn references(&self, entry_id: FaqId) -> bool {
        self.grounding.iter().any(|c| c.id() == entry_id)
    }

    pub fn source_entry_id(&self) -> Option<FaqId> {
        self.grounding.first().map(RetrievalCandidate::id)
    }
}

const MIN_ANSWER_CHARS: usize = 50;
const MAX_ANSWER_CHARS: usize = 1000;
const GREETINGS: [&str; 3] = ["thank you", "hello", "hi"];
const CLOSINGS: [&str; 4] = ["contact", "help", "assistance", "support"];

/// Presentation heuristics on a final answer. Observability only; never gates acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub score: f32,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

impl QualityReport {
    pub fn assess(answer: &str) -> Self {
        let mut penalty = 0.0f32;
        let mut issues = Vec::new();
        let mut suggestions = Vec::new();

        let len = answer.chars().count();
        if len < MIN_ANSWER_CHARS {
            issues.push("Response too short".to_string());
            penalty += 0.2;
        } else if len > MAX_ANSWER_CHARS {
            issues.push("Response too long".to_string());
            penalty += 0.1;
        }

        let lower = answer.to_lowercase();
        if !GREETINGS.iter().any(|g| lower.contains(g)) {
            suggestions.push("Consider adding a greeting".to_string());
            penalty += 0.1;
        }
        if !CLOSINGS.iter().any(|c| lower.contains(c)) {
            suggestions.push("Consider adding contact information".to_string());
            penalty += 0.1;
        }

        Self {
            score: (0.8 - penalty).clamp(0.0, 1.0),
            issues,
            suggestions,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}
