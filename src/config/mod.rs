mod file_config;

pub use file_config::{EmbeddingConfig, FileConfig, RecommendationsConfig};

use crate::recommend::RecommendationSettings;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub catalog_db: Option<PathBuf>,
    pub embeddings_db: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub embedding_url: Option<String>,
    pub embedding_model: Option<String>,
    pub embedding_timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub catalog_db: PathBuf,
    pub embeddings_db: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,

    // Feature configs (with defaults)
    pub recommendations: RecommendationSettings,
    pub embedding: Option<EmbeddingSettings>,
}

/// Live embedding backend, used for summaries absent from the artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingSettings {
    pub url: String,
    pub model: Option<String>,
    pub timeout_sec: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let catalog_db = file
            .catalog_db
            .map(PathBuf::from)
            .or_else(|| cli.catalog_db.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("catalog_db must be specified via --catalog-db or in config file")
            })?;
        if !catalog_db.is_file() {
            bail!("Catalog database does not exist: {:?}", catalog_db);
        }

        let embeddings_db = file
            .embeddings_db
            .map(PathBuf::from)
            .or_else(|| cli.embeddings_db.clone());
        if let Some(path) = &embeddings_db {
            if !path.is_file() {
                bail!("Embeddings database does not exist: {:?}", path);
            }
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);

        // Recommendation settings - merge file config with defaults
        let defaults = RecommendationSettings::default();
        let rec_file = file.recommendations.unwrap_or_default();
        let recommendations = RecommendationSettings {
            max_results: rec_file.max_results.unwrap_or(defaults.max_results),
            summary_top_k: rec_file.summary_top_k.unwrap_or(defaults.summary_top_k),
            title_min_score: rec_file.title_min_score.unwrap_or(defaults.title_min_score),
            creator_roles: rec_file.creator_roles.unwrap_or(defaults.creator_roles),
        };
        if recommendations.max_results == 0 {
            bail!("recommendations.max_results must be at least 1");
        }
        if recommendations.summary_top_k == 0 {
            bail!("recommendations.summary_top_k must be at least 1");
        }
        if recommendations.title_min_score > 100 {
            bail!(
                "recommendations.title_min_score must be between 0 and 100, got {}",
                recommendations.title_min_score
            );
        }
        if recommendations
            .creator_roles
            .iter()
            .all(|role| role.trim().is_empty())
        {
            bail!("recommendations.creator_roles must name at least one role");
        }

        // Embedding backend - TOML [embedding] section takes precedence over CLI args
        let emb_file = file.embedding.unwrap_or_default();
        let embedding = emb_file
            .url
            .or_else(|| cli.embedding_url.clone())
            .map(|url| EmbeddingSettings {
                url,
                model: emb_file.model.clone().or_else(|| cli.embedding_model.clone()),
                timeout_sec: emb_file.timeout_sec.unwrap_or(cli.embedding_timeout_sec),
            });

        Ok(Self {
            catalog_db,
            embeddings_db,
            port,
            metrics_port,
            logging_level,
            content_cache_age_sec,
            recommendations,
            embedding,
        })
    }

    /// Model name the artifact is expected to have been built with.
    pub fn embedding_model(&self) -> Option<&str> {
        self.embedding.as_ref().and_then(|e| e.model.as_deref())
    }
}

/// Resolve a CLI path argument to an absolute path.
///
/// Existing paths are canonicalized; missing ones are joined onto the
/// current directory so the later existence check reports them.
pub fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    fn make_temp_db() -> NamedTempFile {
        NamedTempFile::new().unwrap()
    }

    #[test]
    fn test_parse_path() {
        let dir = TempDir::new().unwrap();
        let resolved = parse_path(dir.path().to_str().unwrap()).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, dir.path().canonicalize().unwrap());

        let missing = parse_path("no-such-catalog.db").unwrap();
        assert!(missing.is_absolute());
        assert!(missing.ends_with("no-such-catalog.db"));
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("headers"),
            Some(RequestsLoggingLevel::Headers)
        ));
        // Case insensitive
        assert!(matches!(
            parse_logging_level("PATH"),
            Some(RequestsLoggingLevel::Path)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let catalog = make_temp_db();
        let embeddings = make_temp_db();
        let cli = CliConfig {
            catalog_db: Some(catalog.path().to_path_buf()),
            embeddings_db: Some(embeddings.path().to_path_buf()),
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Headers,
            content_cache_age_sec: 7200,
            embedding_url: Some("http://embedder:8000".to_string()),
            embedding_model: Some("mini".to_string()),
            embedding_timeout_sec: 30,
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.catalog_db, catalog.path());
        assert_eq!(config.embeddings_db.as_deref(), Some(embeddings.path()));
        assert_eq!(config.port, 3001);
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.content_cache_age_sec, 7200);
        assert_eq!(config.recommendations, RecommendationSettings::default());
        assert_eq!(
            config.embedding,
            Some(EmbeddingSettings {
                url: "http://embedder:8000".to_string(),
                model: Some("mini".to_string()),
                timeout_sec: 30,
            })
        );
        assert_eq!(config.embedding_model(), Some("mini"));
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let catalog = make_temp_db();
        let cli = CliConfig {
            catalog_db: Some(PathBuf::from("/should/be/overridden")),
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            content_cache_age_sec: 3600,
            embedding_url: Some("http://cli:1".to_string()),
            embedding_timeout_sec: 30,
            ..Default::default()
        };

        let file_config = FileConfig {
            catalog_db: Some(catalog.path().to_string_lossy().to_string()),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            recommendations: Some(RecommendationsConfig {
                title_min_score: Some(70),
                ..Default::default()
            }),
            embedding: Some(EmbeddingConfig {
                url: Some("http://toml:2".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.catalog_db, catalog.path());
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.recommendations.title_min_score, 70);
        let embedding = config.embedding.unwrap();
        assert_eq!(embedding.url, "http://toml:2");
        // CLI value used when TOML doesn't specify
        assert_eq!(embedding.timeout_sec, 30);
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.content_cache_age_sec, 3600);
        assert_eq!(config.recommendations.max_results, 20);
    }

    #[test]
    fn test_resolve_missing_catalog_db_error() {
        let cli = CliConfig::default();
        let result = AppConfig::resolve(&cli, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("catalog_db must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_catalog_db_error() {
        let cli = CliConfig {
            catalog_db: Some(PathBuf::from("/nonexistent/catalog.db")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_catalog_db_directory_error() {
        let dir = TempDir::new().unwrap();
        let cli = CliConfig {
            catalog_db: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_resolve_nonexistent_embeddings_db_error() {
        let catalog = make_temp_db();
        let cli = CliConfig {
            catalog_db: Some(catalog.path().to_path_buf()),
            embeddings_db: Some(PathBuf::from("/nonexistent/embeddings.db")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Embeddings database does not exist"));
    }

    #[test]
    fn test_resolve_embedding_disabled_without_url() {
        let catalog = make_temp_db();
        let cli = CliConfig {
            catalog_db: Some(catalog.path().to_path_buf()),
            embedding_model: Some("unused".to_string()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, None).unwrap();
        assert!(config.embedding.is_none());
        assert!(config.embeddings_db.is_none());
    }

    #[test]
    fn test_resolve_rejects_invalid_recommendation_settings() {
        let catalog = make_temp_db();
        let cli = CliConfig {
            catalog_db: Some(catalog.path().to_path_buf()),
            ..Default::default()
        };

        let invalid = [
            RecommendationsConfig {
                max_results: Some(0),
                ..Default::default()
            },
            RecommendationsConfig {
                summary_top_k: Some(0),
                ..Default::default()
            },
            RecommendationsConfig {
                title_min_score: Some(101),
                ..Default::default()
            },
            RecommendationsConfig {
                creator_roles: Some(vec![]),
                ..Default::default()
            },
        ];

        for recommendations in invalid {
            let file_config = FileConfig {
                recommendations: Some(recommendations.clone()),
                ..Default::default()
            };
            assert!(
                AppConfig::resolve(&cli, Some(file_config)).is_err(),
                "accepted {:?}",
                recommendations
            );
        }
    }
}
