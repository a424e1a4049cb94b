//! Text to vector capability used for summary queries.

use super::index::SummaryIndex;
use super::EmbeddingError;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Computes embeddings with a fixed output dimension.
///
/// Must be the same model that produced the stored artifact, otherwise
/// every similarity is meaningless.
#[async_trait]
pub trait SummaryEmbedder: Send + Sync {
    fn name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Embedding service reached over HTTP.
///
/// Sends `POST {base_url}/embed` with `{"model", "input"}` and expects
/// `{"embedding": [..]}` back. Without a model name the field is omitted
/// and the service uses its default.
pub struct HttpSummaryEmbedder {
    client: Client,
    base_url: String,
    model: Option<String>,
}

impl HttpSummaryEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        model: Option<String>,
        timeout_sec: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create embedding HTTP client")?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            model,
        })
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

#[async_trait]
impl SummaryEmbedder for HttpSummaryEmbedder {
    fn name(&self) -> &str {
        "http"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embed", self.base_url);
        debug!(model = ?self.model, chars = text.len(), "Requesting summary embedding");

        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: self.model.as_deref(),
                input: text,
            })
            .send()
            .await
            .map_err(|e| EmbeddingError::Backend(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbeddingError::Backend(format!(
                "embedding service returned status {}",
                response.status()
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Backend(format!("invalid response: {}", e)))?;

        if body.embedding.is_empty() {
            return Err(EmbeddingError::EmptyVector);
        }
        if body.embedding.iter().any(|v| !v.is_finite()) {
            return Err(EmbeddingError::NonFinite);
        }
        Ok(body.embedding)
    }
}

/// Serves vectors already present in the artifact.
///
/// A summary text that was embedded offline gets its stored vector back;
/// anything else goes to `fallback` when one is configured.
pub struct StoredVectorEmbedder {
    index: Arc<SummaryIndex>,
    fallback: Option<Arc<dyn SummaryEmbedder>>,
}

impl StoredVectorEmbedder {
    pub fn new(index: Arc<SummaryIndex>, fallback: Option<Arc<dyn SummaryEmbedder>>) -> Self {
        Self { index, fallback }
    }
}

#[async_trait]
impl SummaryEmbedder for StoredVectorEmbedder {
    fn name(&self) -> &str {
        "stored"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(vector) = self.index.stored_vector(text) {
            return Ok(vector.to_vec());
        }
        match &self.fallback {
            Some(fallback) => fallback.embed(text).await,
            None => Err(EmbeddingError::Unavailable),
        }
    }
}

const DIMENSION_CHECK_TEXT: &str = "dimension check";

/// Startup consistency check between the artifact and the live embedder.
///
/// A model name or dimension disagreement is fatal. A backend that cannot
/// be reached right now is only logged.
pub async fn verify_embedder(
    index: &SummaryIndex,
    embedder: Option<&dyn SummaryEmbedder>,
    configured_model: Option<&str>,
) -> Result<()> {
    if let (Some(configured), Some(stored)) = (configured_model, index.model()) {
        if configured != stored {
            bail!(
                "Embedding model '{}' does not match the artifact's model '{}'",
                configured,
                stored
            );
        }
    }

    let embedder = match embedder {
        Some(embedder) => embedder,
        None => return Ok(()),
    };
    if index.is_empty() {
        return Ok(());
    }

    match embedder.embed(DIMENSION_CHECK_TEXT).await {
        Ok(vector) => {
            index.check_dimension(&vector).with_context(|| {
                format!(
                    "Embedding backend '{}' disagrees with the stored artifact",
                    embedder.name()
                )
            })?;
            info!(
                "Embedding backend '{}' verified ({} dimensions)",
                embedder.name(),
                vector.len()
            );
        }
        Err(err) => {
            warn!(
                "Embedding backend '{}' not reachable at startup: {}",
                embedder.name(),
                err
            );
        }
    }
    Ok(())
}
