//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own catalog and embedding artifact.

use super::constants::*;
use super::fixtures::{create_test_catalog, spawn_embedding_service};
use comics_catalog_server::config::EmbeddingSettings;
use comics_catalog_server::recommend::RecommendationSettings;
use comics_catalog_server::{make_app, LoadedCatalog, RequestsLoggingLevel, ServerConfig};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated catalog files
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a test server that only knows the vectors stored in the artifact.
    pub async fn spawn() -> Self {
        Self::spawn_with(None).await
    }

    /// Spawns a test server backed by a fake embedding service, so summaries
    /// outside the artifact can still be embedded.
    pub async fn spawn_with_embedding_service() -> Self {
        let url = spawn_embedding_service()
            .await
            .expect("Failed to start embedding service");
        Self::spawn_with(Some(EmbeddingSettings {
            url,
            model: Some(EMBEDDING_MODEL.to_string()),
            timeout_sec: REQUEST_TIMEOUT_SECS,
        }))
        .await
    }

    async fn spawn_with(embedding: Option<EmbeddingSettings>) -> Self {
        let (temp_dir, catalog_db_path, embeddings_db_path) =
            create_test_catalog().expect("Failed to create test catalog");

        let loaded = LoadedCatalog::load(
            &catalog_db_path,
            Some(&embeddings_db_path),
            embedding.as_ref(),
            RecommendationSettings::default(),
        )
        .await
        .expect("Failed to load test catalog");

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            content_cache_age_sec: 0, // Disable caching in tests
            ..Default::default()
        };

        let app = make_app(config, loaded.issue_store, loaded.engine);

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
