use axum::extract::FromRef;

use crate::catalog::IssueStore;
use crate::recommend::RecommendationEngine;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedIssueStore = Arc<dyn IssueStore>;
pub type GuardedRecommendationEngine = Arc<RecommendationEngine>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub issue_store: GuardedIssueStore,
    pub engine: GuardedRecommendationEngine,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        issue_store: GuardedIssueStore,
        engine: GuardedRecommendationEngine,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            issue_store,
            engine,
        }
    }
}

impl FromRef<ServerState> for GuardedIssueStore {
    fn from_ref(input: &ServerState) -> Self {
        input.issue_store.clone()
    }
}

impl FromRef<ServerState> for GuardedRecommendationEngine {
    fn from_ref(input: &ServerState) -> Self {
        input.engine.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
