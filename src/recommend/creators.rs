use super::models::CreatorMatch;
use crate::catalog::{Issue, SeriesCatalog};
use crate::credits::authorial_creators;
use std::sync::Arc;

/// Ranks series by how many authorial creators they share with an issue.
///
/// Per-series creator sets are aggregated once in the [`SeriesCatalog`];
/// a request only parses the query issue's own credits.
pub struct CreatorOverlapScorer {
    series: Arc<SeriesCatalog>,
    roles: Vec<String>,
}

impl CreatorOverlapScorer {
    pub fn new(series: Arc<SeriesCatalog>, roles: Vec<String>) -> Self {
        Self { series, roles }
    }

    pub fn score_issue(&self, issue: &Issue, max_results: usize) -> Vec<CreatorMatch> {
        let creators = authorial_creators(issue.creators.as_deref(), &self.roles);
        if creators.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<CreatorMatch> = self
            .series
            .iter()
            .filter(|series| series.series_id != issue.series_id)
            .filter_map(|series| {
                let shared = series.creators.intersection(&creators).count();
                (shared > 0).then(|| CreatorMatch {
                    series_id: series.series_id,
                    series_title: series.title.clone(),
                    image: series.cover_image.clone(),
                    match_score: shared as u32,
                })
            })
            .collect();

        // Stable: equal overlaps stay in ascending series id order
        matches.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        matches.truncate(max_results);
        matches
    }
}
