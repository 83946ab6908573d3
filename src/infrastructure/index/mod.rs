pub mod codec;
mod flat;

pub use flat::{ScoredRow, VectorIndex};
