mod base;
mod loader;
mod snapshot;

pub use base::KnowledgeBase;
pub use loader::SnapshotLoader;
pub use snapshot::{KnowledgeSnapshot, SnapshotStore};
