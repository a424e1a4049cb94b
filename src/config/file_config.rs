use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub catalog_db: Option<String>,
    pub embeddings_db: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub content_cache_age_sec: Option<usize>,

    // Feature configs
    pub recommendations: Option<RecommendationsConfig>,
    pub embedding: Option<EmbeddingConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RecommendationsConfig {
    pub max_results: Option<usize>,
    pub summary_top_k: Option<usize>,
    pub title_min_score: Option<u8>,
    pub creator_roles: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding service, without the `/embed` suffix
    pub url: Option<String>,
    pub model: Option<String>,
    pub timeout_sec: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
