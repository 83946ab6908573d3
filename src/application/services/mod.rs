mod classification;
pub mod evaluation;
mod orchestrator;
mod response;
mod retrieval;

pub use classification::ClassificationAgent;
pub use evaluation::{evaluate, EvalCase, EvalOutcome, EvalReport, ResponseTimeStats};
pub use orchestrator::{Orchestrator, OrchestratorSettings, PipelineError};
pub use response::{ResponseAgent, ResponsePolicy};
pub use retrieval::RetrievalAgent;
