//! Application layer - the three agents, the orchestrator sequencing them, and the
//! offline evaluation harness.
//!
//! Services depend on domain ports (traits) rather than concrete implementations.

pub mod services;

pub use services::{
    evaluate, ClassificationAgent, EvalCase, EvalOutcome, EvalReport, Orchestrator,
    OrchestratorSettings, PipelineError, ResponseAgent, ResponsePolicy, RetrievalAgent,
};
