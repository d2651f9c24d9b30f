use std::sync::Arc;

use crate::{
    config::Config,
    services::{extraction::TextExtractor, llm::QuestionGenerator},
};
use axum::extract::FromRef;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub extractor: Arc<dyn TextExtractor>,
    pub generator: Arc<dyn QuestionGenerator>,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn TextExtractor> {
    fn from_ref(state: &AppState) -> Self {
        state.extractor.clone()
    }
}

impl FromRef<AppState> for Arc<dyn QuestionGenerator> {
    fn from_ref(state: &AppState) -> Self {
        state.generator.clone()
    }
}
