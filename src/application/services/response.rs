use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::domain::{
    ports::{ResponseSynthesizer, ResponseValidator, Strictness, SynthesisRequest},
    ClassificationResult, Diagnostic, DomainError, QualityReport, Query, RetrievalCandidate,
    Stage, StageTimings, SupportResponse, ValidationStatus,
};

#[derive(Debug, Clone)]
pub struct ResponsePolicy {
    /// Synthesis attempts before falling back to the best source answer. The first
    /// attempt is standard, every later one strict.
    pub max_attempts: u32,
    /// Leading candidates handed to the synthesizer.
    pub grounding_limit: usize,
    /// Per-attempt limit.
    pub timeout: Duration,
    /// Answer used when there is no grounding at all.
    pub fallback_text: String,
}

/// Synthesizes an answer from retrieved entries and checks it against them.
pub struct ResponseAgent {
    synthesizer: Arc<dyn ResponseSynthesizer>,
    validator: Arc<dyn ResponseValidator>,
    policy: ResponsePolicy,
}

struct Outcome {
    answer: String,
    validation: ValidationStatus,
    attempts: u32,
    diagnostics: Vec<Diagnostic>,
}

impl ResponseAgent {
    pub fn new(
        synthesizer: Arc<dyn ResponseSynthesizer>,
        validator: Arc<dyn ResponseValidator>,
        policy: ResponsePolicy,
    ) -> Self {
        Self {
            synthesizer,
            validator,
            policy,
        }
    }

    /// Always terminates within `max_attempts` synthesis calls. With no candidates the
    /// fixed fallback text is returned as `Rejected` without calling the synthesizer.
    #[instrument(
        skip(self, query, classification, candidates),
        fields(query_id = %query.id, category = %classification.category, candidates = candidates.len())
    )]
    pub async fn generate(
        &self,
        query: &Query,
        classification: &ClassificationResult,
        candidates: Vec<RetrievalCandidate>,
    ) -> SupportResponse {
        let outcome = if candidates.is_empty() {
            Outcome {
                answer: self.policy.fallback_text.clone(),
                validation: ValidationStatus::Rejected,
                attempts: 0,
                diagnostics: Vec::new(),
            }
        } else {
            self.synthesize_validated(query, classification, &candidates)
                .await
        };

        info!(
            validation = ?outcome.validation,
            attempts = outcome.attempts,
            "response ready"
        );

        SupportResponse {
            query_id: query.id,
            session_id: query.session_id,
            quality: QualityReport::assess(&outcome.answer),
            answer: outcome.answer,
            category: classification.category.clone(),
            classification: classification.clone(),
            grounding: candidates,
            validation: outcome.validation,
            synthesis_attempts: outcome.attempts,
            diagnostics: outcome.diagnostics,
            timings: StageTimings::default(),
            responded_at: Utc::now(),
        }
    }

    async fn synthesize_validated(
        &self,
        query: &Query,
        classification: &ClassificationResult,
        candidates: &[RetrievalCandidate],
    ) -> Outcome {
        let grounding = &candidates[..candidates.len().min(self.policy.grounding_limit.max(1))];
        let mut diagnostics = Vec::new();
        let mut attempts = 0;

        while attempts < self.policy.max_attempts {
            let strictness = if attempts == 0 {
                Strictness::Standard
            } else {
                Strictness::Strict
            };
            attempts += 1;

            let request = SynthesisRequest {
                query: &query.text,
                category: &classification.category,
                grounding,
                strictness,
            };

            match self.attempt(request).await {
                Ok(answer) => {
                    let verdict = self.validator.validate(&answer, grounding);
                    if verdict.accepted {
                        return Outcome {
                            answer,
                            validation: ValidationStatus::Accepted,
                            attempts,
                            diagnostics,
                        };
                    }
                    warn!(attempt = attempts, score = verdict.score, "answer failed validation");
                    diagnostics.push(Diagnostic::new(
                        Stage::Response,
                        &DomainError::validation_failed(format!(
                            "attempt {attempts} overlap {:.2} below threshold",
                            verdict.score
                        )),
                    ));
                }
                Err(e) => {
                    warn!(attempt = attempts, error = %e, "synthesis failed");
                    diagnostics.push(Diagnostic::new(Stage::Response, &e));
                }
            }
        }

        Outcome {
            answer: candidates[0].entry.answer.clone(),
            validation: ValidationStatus::FallbackToSource,
            attempts,
            diagnostics,
        }
    }

    async fn attempt(&self, request: SynthesisRequest<'_>) -> Result<String, DomainError> {
        tokio::time::timeout(self.policy.timeout, self.synthesizer.synthesize(request))
            .await
            .map_err(|_| {
                DomainError::backend_timeout(format!(
                    "synthesis exceeded {:?}",
                    self.policy.timeout
                ))
            })?
    }
}
