use super::models::SummaryMatch;
use crate::catalog::{Issue, SeriesCatalog};
use crate::embeddings::{EmbeddingError, SummaryEmbedder, SummaryIndex};
use std::sync::Arc;
use tracing::debug;

/// Ranks series by how close their summaries are to an issue's summary.
pub struct SummarySimilarityScorer {
    index: Arc<SummaryIndex>,
    embedder: Arc<dyn SummaryEmbedder>,
    series: Arc<SeriesCatalog>,
}

impl SummarySimilarityScorer {
    pub fn new(
        index: Arc<SummaryIndex>,
        embedder: Arc<dyn SummaryEmbedder>,
        series: Arc<SeriesCatalog>,
    ) -> Self {
        Self {
            index,
            embedder,
            series,
        }
    }

    pub fn index(&self) -> &SummaryIndex {
        &self.index
    }

    /// A blank summary or an empty index yields no matches without calling
    /// the embedder.
    pub async fn score_issue(
        &self,
        issue: &Issue,
        top_k: usize,
        max_results: usize,
    ) -> Result<Vec<SummaryMatch>, EmbeddingError> {
        let summary = match issue.summary.as_deref().map(str::trim) {
            Some(summary) if !summary.is_empty() => summary,
            _ => return Ok(Vec::new()),
        };
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(summary).await?;
        debug!(
            issue_id = issue.issue_id,
            embedder = self.embedder.name(),
            "Embedded summary query"
        );

        let ranked = self
            .index
            .rank_series(&query, issue.series_id, top_k.min(max_results))?;

        Ok(ranked
            .into_iter()
            .map(|(series_id, similarity)| SummaryMatch {
                series_id,
                series_title: self
                    .series
                    .title(series_id)
                    .or_else(|| self.index.series_title(series_id))
                    .unwrap_or_default()
                    .to_string(),
                image: self
                    .series
                    .cover_image(series_id)
                    .map(|image| image.to_string()),
                similarity_score: similarity,
            })
            .collect())
    }
}
