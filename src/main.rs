use anyhow::Result;
use clap::Parser;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use comics_catalog_server::config::{parse_path, AppConfig, CliConfig, FileConfig};
use comics_catalog_server::server::metrics;
use comics_catalog_server::{run_server, LoadedCatalog, RequestsLoggingLevel, ServerConfig};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite catalog database file.
    #[clap(long, value_parser = parse_path)]
    pub catalog_db: Option<PathBuf>,

    /// Path to the SQLite artifact holding precomputed summary embeddings.
    #[clap(long, value_parser = parse_path)]
    pub embeddings_db: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of content in the cache in seconds.
    #[clap(long, default_value_t = 3600)]
    pub content_cache_age_sec: usize,

    /// URL of an embedding service used for summaries without a stored vector.
    #[clap(long)]
    pub embedding_url: Option<String>,

    /// Embedding model name. Must match the model the artifact was built with.
    #[clap(long)]
    pub embedding_model: Option<String>,

    /// Timeout in seconds for embedding requests.
    #[clap(long, default_value_t = 30)]
    pub embedding_timeout_sec: u64,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            catalog_db: self.catalog_db.clone(),
            embeddings_db: self.embeddings_db.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            content_cache_age_sec: self.content_cache_age_sec,
            embedding_url: self.embedding_url.clone(),
            embedding_model: self.embedding_model.clone(),
            embedding_timeout_sec: self.embedding_timeout_sec,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let loaded = LoadedCatalog::load(
        &config.catalog_db,
        config.embeddings_db.as_deref(),
        config.embedding.as_ref(),
        config.recommendations.clone(),
    )
    .await?;

    // Initialize metrics system
    info!("Initializing metrics...");
    metrics::init_metrics();
    loaded.report_metrics();

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level,
        port: config.port,
        metrics_port: config.metrics_port,
        content_cache_age_sec: config.content_cache_age_sec,
    };
    run_server(server_config, loaded.issue_store, loaded.engine).await
}
