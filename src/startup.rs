//! Loading of every read-only structure the server and CLI need.

use crate::catalog::{load_issue_catalog, Dataset, IssueStore};
use crate::config::EmbeddingSettings;
use crate::embeddings::{
    load_summary_index, verify_embedder, HttpSummaryEmbedder, StoredVectorEmbedder,
    SummaryEmbedder, SummaryIndex,
};
use crate::recommend::{RecommendationEngine, RecommendationSettings};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct LoadedCatalog {
    pub issue_store: Arc<dyn IssueStore>,
    pub engine: Arc<RecommendationEngine>,
}

impl LoadedCatalog {
    /// Read the catalog and optional embedding artifact, check the embedding
    /// backend against the artifact and build the recommendation indexes.
    pub async fn load(
        catalog_db: &Path,
        embeddings_db: Option<&Path>,
        embedding: Option<&EmbeddingSettings>,
        settings: RecommendationSettings,
    ) -> Result<Self> {
        info!("Opening SQLite catalog database at {:?}...", catalog_db);
        let issue_store: Arc<dyn IssueStore> = Arc::new(load_issue_catalog(catalog_db)?);

        let index = match embeddings_db {
            Some(path) => {
                info!("Loading summary embeddings from {:?}...", path);
                Arc::new(load_summary_index(path)?)
            }
            None => {
                info!("No embeddings database configured, summary recommendations disabled");
                Arc::new(SummaryIndex::empty())
            }
        };

        let backend: Option<Arc<dyn SummaryEmbedder>> = match embedding {
            Some(settings) => {
                info!("Embedding service configured at {}", settings.url);
                Some(Arc::new(HttpSummaryEmbedder::new(
                    settings.url.clone(),
                    settings.model.clone(),
                    settings.timeout_sec,
                )?))
            }
            None => None,
        };
        verify_embedder(
            &index,
            backend.as_deref(),
            embedding.and_then(|e| e.model.as_deref()),
        )
        .await?;

        let embedder = Arc::new(StoredVectorEmbedder::new(index.clone(), backend));

        info!("Building recommendation indexes...");
        let engine = Arc::new(RecommendationEngine::new(
            issue_store.clone(),
            index,
            embedder,
            settings,
        ));

        Ok(Self {
            issue_store,
            engine,
        })
    }

    /// Feed catalog sizes to the Prometheus gauges.
    pub fn report_metrics(&self) {
        crate::server::metrics::init_catalog_metrics(
            self.issue_store.count(Dataset::Original),
            self.issue_store.count(Dataset::Variant),
            self.engine.series().len(),
            self.engine.summary_index().len(),
        );
    }
}
