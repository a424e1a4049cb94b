//! Print the recommendations of one issue as JSON, without starting the server.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use comics_catalog_server::config::{parse_path, EmbeddingSettings};
use comics_catalog_server::recommend::RecommendationSettings;
use comics_catalog_server::LoadedCatalog;

#[derive(Parser, Debug)]
#[command(name = "cli-recommend")]
#[command(about = "Compute the three recommendation lists of a catalog issue")]
struct CliArgs {
    /// Path to the SQLite catalog database file.
    #[clap(value_parser = parse_path)]
    catalog_db: PathBuf,

    /// Issue to recommend from.
    issue_id: i64,

    /// Path to the SQLite artifact holding precomputed summary embeddings.
    #[clap(long, value_parser = parse_path)]
    embeddings_db: Option<PathBuf>,

    /// URL of an embedding service used for summaries without a stored vector.
    #[clap(long)]
    embedding_url: Option<String>,

    /// Embedding model name. Must match the model the artifact was built with.
    #[clap(long)]
    embedding_model: Option<String>,

    /// Timeout in seconds for embedding requests.
    #[clap(long, default_value_t = 30)]
    embedding_timeout_sec: u64,

    /// Maximum number of entries per list.
    #[clap(long, default_value_t = 20)]
    max_results: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    if args.max_results == 0 {
        anyhow::bail!("--max-results must be at least 1");
    }

    let embedding = args.embedding_url.map(|url| EmbeddingSettings {
        url,
        model: args.embedding_model,
        timeout_sec: args.embedding_timeout_sec,
    });
    let settings = RecommendationSettings {
        max_results: args.max_results,
        ..Default::default()
    };

    let loaded = LoadedCatalog::load(
        &args.catalog_db,
        args.embeddings_db.as_deref(),
        embedding.as_ref(),
        settings,
    )
    .await?;

    let recommendations = loaded.engine.recommend(args.issue_id).await?;
    println!("{}", serde_json::to_string_pretty(&recommendations)?);
    Ok(())
}
