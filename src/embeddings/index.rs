//! Brute-force cosine similarity over the stored summary embeddings.

use super::EmbeddingError;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// Added to the norm product so near-zero vectors never divide by zero.
pub const COSINE_EPSILON: f32 = 1e-8;

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingEntry {
    pub series_id: i64,
    pub series_title: String,
    pub summary: String,
    pub vector: Vec<f32>,
}

/// Cosine similarity of two equally sized vectors.
///
/// Accumulates in f64. Callers check dimensions beforehand.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x = f64::from(x);
        let y = f64::from(y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt() + f64::from(COSINE_EPSILON))) as f32
}

/// Immutable set of summary vectors, each tagged with its series.
#[derive(Debug, Default)]
pub struct SummaryIndex {
    dimension: usize,
    model: Option<String>,
    entries: Vec<EmbeddingEntry>,
    by_summary: HashMap<String, usize>,
    series_titles: HashMap<i64, String>,
}

impl SummaryIndex {
    /// Build an index whose vectors all have `dimension` components.
    pub fn new(
        dimension: usize,
        model: Option<String>,
        entries: Vec<EmbeddingEntry>,
    ) -> Result<Self, EmbeddingError> {
        if dimension == 0 && !entries.is_empty() {
            return Err(EmbeddingError::EmptyVector);
        }

        let mut by_summary = HashMap::with_capacity(entries.len());
        let mut series_titles = HashMap::new();
        for (position, entry) in entries.iter().enumerate() {
            if entry.vector.len() != dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimension,
                    actual: entry.vector.len(),
                });
            }
            if entry.vector.iter().any(|v| !v.is_finite()) {
                return Err(EmbeddingError::NonFinite);
            }
            by_summary
                .entry(entry.summary.trim().to_string())
                .or_insert(position);
            series_titles
                .entry(entry.series_id)
                .or_insert_with(|| entry.series_title.clone());
        }

        Ok(SummaryIndex {
            dimension,
            model,
            entries,
            by_summary,
            series_titles,
        })
    }

    /// An index without entries; every query ranks nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Name of the model that produced the stored vectors, if recorded.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[EmbeddingEntry] {
        &self.entries
    }

    /// The stored vector of an indexed summary, matched on exact text
    /// after trimming surrounding whitespace on both sides.
    pub fn stored_vector(&self, summary: &str) -> Option<&[f32]> {
        self.by_summary
            .get(summary.trim())
            .map(|position| self.entries[*position].vector.as_slice())
    }

    /// Series title as recorded in the artifact.
    pub fn series_title(&self, series_id: i64) -> Option<&str> {
        self.series_titles.get(&series_id).map(|t| t.as_str())
    }

    /// Fails on a query vector of the wrong size, never pads or truncates.
    pub fn check_dimension(&self, query: &[f32]) -> Result<(), EmbeddingError> {
        if query.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        Ok(())
    }

    /// Rank series by their best matching summary.
    ///
    /// Every entry is scored against `query`; a series scores the maximum
    /// over its entries. `exclude_series` never appears in the output.
    /// Sorted by descending similarity, ties by ascending series id.
    pub fn rank_series(
        &self,
        query: &[f32],
        exclude_series: i64,
        top_k: usize,
    ) -> Result<Vec<(i64, f32)>, EmbeddingError> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        self.check_dimension(query)?;

        let similarities: Vec<(i64, f32)> = self
            .entries
            .par_iter()
            .filter(|entry| entry.series_id != exclude_series)
            .map(|entry| (entry.series_id, cosine_similarity(query, &entry.vector)))
            .collect();

        let mut best_by_series: BTreeMap<i64, f32> = BTreeMap::new();
        for (series_id, similarity) in similarities {
            best_by_series
                .entry(series_id)
                .and_modify(|best| {
                    if similarity > *best {
                        *best = similarity;
                    }
                })
                .or_insert(similarity);
        }

        let mut ranked: Vec<(i64, f32)> = best_by_series.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_k);
        Ok(ranked)
    }
}
