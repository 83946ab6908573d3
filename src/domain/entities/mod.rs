mod category;
mod classification;
mod embedding;
mod faq;
mod pipeline;
mod query;
mod response;
mod retrieval;

pub use category::{Category, CategorySet, UNCATEGORIZED};
pub use classification::{CategoryScore, ClassificationResult};
pub use embedding::{DistanceMetric, Embedding};
pub use faq::{FaqEntry, FaqId, FaqMetadata};
pub use pipeline::{Diagnostic, PipelineState, Stage};
pub use query::Query;
pub use response::{QualityReport, StageTimings, SupportResponse, ValidationStatus};
pub use retrieval::{IndexRow, RetrievalCandidate};
