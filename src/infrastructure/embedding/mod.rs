mod hashing;
mod openai;

pub use hashing::{HashingEmbedding, MIN_DIMENSION};
pub use openai::OpenAiEmbedding;
