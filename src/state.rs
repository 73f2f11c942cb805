use std::sync::Arc;

use crate::{
    config::Config,
    services::{AttemptManager, ExamCatalog, ExamStatistics},
    store::ExamStore,
};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub catalog: ExamCatalog,
    pub attempts: AttemptManager,
    pub stats: ExamStatistics,
    pub config: Config,
}

impl AppState {
    /// Wires the services around one store.
    pub fn new(store: Arc<dyn ExamStore>, config: Config) -> Self {
        let catalog = ExamCatalog::new(store.clone());
        Self {
            attempts: AttemptManager::new(store.clone(), catalog.clone()),
            stats: ExamStatistics::new(store, catalog.clone()),
            catalog,
            config,
        }
    }
}

impl FromRef<AppState> for ExamCatalog {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}

impl FromRef<AppState> for AttemptManager {
    fn from_ref(state: &AppState) -> Self {
        state.attempts.clone()
    }
}

impl FromRef<AppState> for ExamStatistics {
    fn from_ref(state: &AppState) -> Self {
        state.stats.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
