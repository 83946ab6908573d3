use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{ClassificationAgent, ResponseAgent, RetrievalAgent};
use crate::domain::{
    Diagnostic, DomainError, PipelineState, Query, Stage, StageTimings, SupportResponse,
};

/// Structured failure of one query. `stage` is where the pipeline stopped.
#[derive(Debug, Clone, Error)]
#[error("query {query_id} failed during {stage}: {source}")]
pub struct PipelineError {
    pub query_id: Uuid,
    pub stage: Stage,
    #[source]
    pub source: DomainError,
}

impl PipelineError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self.source, DomainError::InvalidInput(_))
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub top_k: usize,
    pub max_query_chars: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_query_chars: 2_000,
        }
    }
}

/// Tracks one query through the state machine and logs each transition.
struct Run {
    query_id: Uuid,
    state: PipelineState,
}

impl Run {
    fn new(query_id: Uuid) -> Self {
        debug!(%query_id, state = %PipelineState::Received, "pipeline started");
        Self {
            query_id,
            state: PipelineState::Received,
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            debug!(query_id = %self.query_id, from = %self.state, to = %next, "transition");
            self.state = next;
        }
    }

    fn fail(&mut self, source: DomainError) -> PipelineError {
        let stage = self.state.pending_stage().unwrap_or(Stage::Response);
        warn!(
            query_id = %self.query_id,
            from = %self.state,
            to = %PipelineState::Errored,
            %stage,
            error = %source,
            "transition"
        );
        self.state = PipelineState::Errored;
        PipelineError {
            query_id: self.query_id,
            stage,
            source,
        }
    }
}

/// Runs classification, retrieval and response strictly in sequence. Every call resolves
/// to exactly one `SupportResponse` or one `PipelineError`.
pub struct Orchestrator {
    classification: ClassificationAgent,
    retrieval: RetrievalAgent,
    response: ResponseAgent,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        classification: ClassificationAgent,
        retrieval: RetrievalAgent,
        response: ResponseAgent,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            classification,
            retrieval,
            response,
            settings,
        }
    }

    /// Entry point for callers holding raw text. Blank or oversized text is rejected
    /// before the pipeline starts.
    pub async fn handle_query(
        &self,
        text: &str,
        session_id: Option<Uuid>,
    ) -> Result<SupportResponse, PipelineError> {
        let query = Query::new(text).map_err(|source| PipelineError {
            query_id: Uuid::new_v4(),
            stage: Stage::Intake,
            source,
        })?;
        let query = match session_id {
            Some(id) => query.with_session(id),
            None => query,
        };

        if query.char_len() > self.settings.max_query_chars {
            return Err(PipelineError {
                query_id: query.id,
                stage: Stage::Intake,
                source: DomainError::invalid_input(format!(
                    "query is {} characters, the limit is {}",
                    query.char_len(),
                    self.settings.max_query_chars
                )),
            });
        }

        self.run(query).await
    }

    #[instrument(skip(self, query), fields(query_id = %query.id))]
    pub async fn run(&self, query: Query) -> Result<SupportResponse, PipelineError> {
        let started = Instant::now();
        let mut run = Run::new(query.id);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();

        let stage_started = Instant::now();
        let classification = self.classification.classify(&query).await;
        let classification_ms = elapsed_ms(stage_started);
        diagnostics.extend(classification.diagnostics.iter().cloned());
        run.advance();

        let stage_started = Instant::now();
        let candidates = match self
            .retrieval
            .retrieve(&query.text, &classification.category, self.settings.top_k)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "retrieval degraded");
                diagnostics.push(Diagnostic::new(Stage::Retrieval, &e));
                Vec::new()
            }
            Err(e) => return Err(run.fail(e)),
        };
        let retrieval_ms = elapsed_ms(stage_started);
        if candidates.is_empty() {
            diagnostics.push(Diagnostic::new(
                Stage::Retrieval,
                &DomainError::retrieval_empty("no knowledge base entry matched"),
            ));
        }
        run.advance();

        let stage_started = Instant::now();
        let response = self
            .response
            .generate(&query, &classification, candidates)
            .await;
        let response_ms = elapsed_ms(stage_started);
        run.advance();

        diagnostics.extend(response.diagnostics.iter().cloned());
        let response = SupportResponse {
            diagnostics,
            timings: StageTimings {
                classification_ms,
                retrieval_ms,
                response_ms,
                total_ms: elapsed_ms(started),
            },
            ..response
        };
        run.advance();

        info!(
            category = %response.category,
            confidence = response.classification.confidence,
            candidates = response.grounding.len(),
            validation = ?response.validation,
            total_ms = response.timings.total_ms,
            "query handled"
        );
        Ok(response)
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
