//! Related-series recommendations from three independent signals:
//! shared authorial creators, summary embedding similarity and fuzzy
//! series title similarity.

mod creators;
mod engine;
pub mod fuzzy;
mod models;
mod summary;
mod titles;

pub use creators::CreatorOverlapScorer;
pub use engine::RecommendationEngine;
pub use models::{CreatorMatch, Recommendations, SummaryMatch, TitleMatch};
pub use summary::SummarySimilarityScorer;
pub use titles::TitleSimilarityMatcher;

use crate::credits::DEFAULT_AUTHORIAL_ROLES;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RecommendationError {
    #[error("Issue ID {0} not found in any dataset")]
    IssueNotFound(i64),
}

/// Tunables shared by the three scorers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSettings {
    /// Cap applied to every returned list.
    pub max_results: usize,
    /// How many series the summary index ranks before the cap.
    pub summary_top_k: usize,
    /// Title matches scoring below this are dropped.
    pub title_min_score: u8,
    /// Roles whose credits count as authorial, compared case-insensitively.
    pub creator_roles: Vec<String>,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            max_results: 20,
            summary_top_k: 20,
            title_min_score: 50,
            creator_roles: DEFAULT_AUTHORIAL_ROLES
                .iter()
                .map(|r| r.to_string())
                .collect(),
        }
    }
}
