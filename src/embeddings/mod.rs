//! Summary embeddings: the persisted artifact, the in-memory similarity
//! index built from it and the capability that embeds query text.

mod artifact;
mod embedder;
mod index;

pub use artifact::{load_summary_index, EmbeddingArtifactWriter, EMBEDDINGS_VERSIONED_SCHEMAS};
pub use embedder::{
    verify_embedder, HttpSummaryEmbedder, StoredVectorEmbedder, SummaryEmbedder,
};
pub use index::{cosine_similarity, EmbeddingEntry, SummaryIndex, COSINE_EPSILON};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("Embedding dimension mismatch: index vectors have {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("No embedding backend available for text outside the stored artifact")]
    Unavailable,

    #[error("Embedding backend returned an empty vector")]
    EmptyVector,

    #[error("Embedding contains non-finite values")]
    NonFinite,

    #[error("Embedding backend failed: {0}")]
    Backend(String),
}
