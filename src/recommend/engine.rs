use super::creators::CreatorOverlapScorer;
use super::models::Recommendations;
use super::summary::SummarySimilarityScorer;
use super::titles::TitleSimilarityMatcher;
use super::{RecommendationError, RecommendationSettings};
use crate::catalog::{IssueStore, SeriesCatalog};
use crate::embeddings::{EmbeddingError, SummaryEmbedder, SummaryIndex};
use crate::server::metrics;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

/// Runs the three recommendation signals for one issue.
///
/// Every index is built in [`RecommendationEngine::new`] and only read
/// afterwards. The signals run concurrently and a failing one is reported
/// as an empty list without affecting the others.
pub struct RecommendationEngine {
    store: Arc<dyn IssueStore>,
    series: Arc<SeriesCatalog>,
    creators: Arc<CreatorOverlapScorer>,
    summaries: Arc<SummarySimilarityScorer>,
    titles: Arc<TitleSimilarityMatcher>,
    settings: RecommendationSettings,
}

impl RecommendationEngine {
    pub fn new(
        store: Arc<dyn IssueStore>,
        index: Arc<SummaryIndex>,
        embedder: Arc<dyn SummaryEmbedder>,
        settings: RecommendationSettings,
    ) -> Self {
        let series = Arc::new(SeriesCatalog::build(
            store.issues(),
            &settings.creator_roles,
        ));
        let creators = Arc::new(CreatorOverlapScorer::new(
            series.clone(),
            settings.creator_roles.clone(),
        ));
        let titles = Arc::new(TitleSimilarityMatcher::build(
            store.issues(),
            series.clone(),
        ));
        let summaries = Arc::new(SummarySimilarityScorer::new(
            index,
            embedder,
            series.clone(),
        ));

        Self {
            store,
            series,
            creators,
            summaries,
            titles,
            settings,
        }
    }

    pub fn series(&self) -> &SeriesCatalog {
        &self.series
    }

    pub fn summary_index(&self) -> &SummaryIndex {
        self.summaries.index()
    }

    pub fn settings(&self) -> &RecommendationSettings {
        &self.settings
    }

    pub async fn recommend(&self, issue_id: i64) -> Result<Recommendations, RecommendationError> {
        let issue = self
            .store
            .get_issue(issue_id)
            .cloned()
            .ok_or(RecommendationError::IssueNotFound(issue_id))?;
        let start = Instant::now();
        let max_results = self.settings.max_results;

        let creators_task = {
            let scorer = self.creators.clone();
            let issue = issue.clone();
            tokio::task::spawn_blocking(move || scorer.score_issue(&issue, max_results))
        };
        let titles_task = {
            let matcher = self.titles.clone();
            let issue = issue.clone();
            let min_score = self.settings.title_min_score;
            tokio::task::spawn_blocking(move || {
                matcher.score_issue(&issue, min_score, max_results)
            })
        };
        let summaries_task = {
            let scorer = self.summaries.clone();
            let top_k = self.settings.summary_top_k;
            tokio::spawn(async move { scorer.score_issue(&issue, top_k, max_results).await })
        };

        let (same_creators, title_similarity, from_summary) =
            tokio::join!(creators_task, titles_task, summaries_task);

        let recommendations = Recommendations {
            same_creators: settle("same_creators", issue_id, same_creators.map(Ok)),
            from_summary: settle("from_summary", issue_id, from_summary),
            title_similarity: settle("title_similarity", issue_id, title_similarity.map(Ok)),
        };

        let elapsed = start.elapsed();
        metrics::record_recommendation(elapsed);
        debug!(
            issue_id,
            same_creators = recommendations.same_creators.len(),
            from_summary = recommendations.from_summary.len(),
            title_similarity = recommendations.title_similarity.len(),
            "Computed recommendations in {:?}",
            elapsed
        );
        Ok(recommendations)
    }
}

/// Turn one signal's outcome into its list, logging and counting failures.
fn settle<T>(
    signal: &str,
    issue_id: i64,
    outcome: Result<Result<Vec<T>, EmbeddingError>, JoinError>,
) -> Vec<T> {
    let matches = match outcome {
        Ok(Ok(matches)) => matches,
        Ok(Err(EmbeddingError::Unavailable)) => {
            warn!(
                "No embedding available for issue {}, {} left empty",
                issue_id, signal
            );
            metrics::record_signal_failure(signal, "unavailable");
            Vec::new()
        }
        Ok(Err(e)) => {
            error!("{} failed for issue {}: {}", signal, issue_id, e);
            metrics::record_signal_failure(signal, "error");
            Vec::new()
        }
        Err(e) => {
            error!("{} panicked for issue {}: {}", signal, issue_id, e);
            metrics::record_signal_failure(signal, "panic");
            Vec::new()
        }
    };
    if matches.is_empty() {
        metrics::record_signal_empty(signal);
    }
    matches
}
