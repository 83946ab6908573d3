use std::sync::Arc;

use crate::application::Orchestrator;
use crate::domain::CategorySet;
use crate::infrastructure::{AppConfig, SnapshotLoader, SnapshotStore, SupportStack};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<SnapshotStore>,
    pub loader: Arc<SnapshotLoader>,
    pub categories: Arc<CategorySet>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(stack: SupportStack, config: AppConfig) -> Self {
        Self {
            orchestrator: stack.orchestrator,
            store: stack.store,
            loader: stack.loader,
            categories: Arc::new(stack.categories),
            config: Arc::new(config),
        }
    }
}
