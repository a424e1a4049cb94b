//! Test fixture creation for the catalog and embedding artifact

use super::constants::*;
use anyhow::Result;
use axum::{routing::post, Json, Router};
use comics_catalog_server::catalog::{create_catalog_db, insert_issue, Dataset, Issue};
use comics_catalog_server::embeddings::EmbeddingArtifactWriter;
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::net::TcpListener;

fn issue(
    issue_id: i64,
    series_id: i64,
    title: &str,
    creators: Option<&str>,
    summary: Option<&str>,
) -> Issue {
    Issue {
        issue_id,
        dataset: Dataset::Original,
        series_id,
        series_title: title.to_string(),
        creators: creators.map(String::from),
        summary: summary.map(String::from),
        release_date: None,
        image: Some(format!("https://covers.test/{}.jpg", issue_id)),
        original_issue_id: None,
    }
}

fn fixture_issues() -> Vec<Issue> {
    let mut variant = issue(
        FF_VARIANT_ISSUE_ID,
        FF_SERIES_ID,
        "Fantastic Four",
        Some("Writer: Stan Lee"),
        Some("A hero rises"),
    );
    variant.dataset = Dataset::Variant;
    variant.original_issue_id = Some(FF_ISSUE_ID);

    vec![
        issue(
            FF_ISSUE_ID,
            FF_SERIES_ID,
            "Fantastic Four",
            Some("Writer: Stan Lee; Penciller: Jack Kirby"),
            Some("A hero rises"),
        ),
        issue(FF_BLANK_ISSUE_ID, FF_SERIES_ID, "Fantastic Four", None, Some("  ")),
        issue(
            JIM_ISSUE_ID,
            JIM_SERIES_ID,
            "Journey into Mystery",
            Some("Writer: Stan Lee; Inker: Joe Sinnott"),
            Some("A god falls"),
        ),
        issue(
            FFU_ISSUE_ID,
            FFU_SERIES_ID,
            "Fantastic Four Unlimited",
            None,
            Some("A family fights"),
        ),
        issue(ASM_ISSUE_ID, ASM_SERIES_ID, "Amazing Spider-Man", None, None),
        issue(TASM_ISSUE_ID, TASM_SERIES_ID, "The Amazing Spiderman", None, None),
        issue(
            SURFER_ISSUE_ID,
            SURFER_SERIES_ID,
            "Silver Surfer",
            Some("Writer: Stan Lee; Penciller: John Buscema"),
            Some("A cosmic threat"),
        ),
        variant,
    ]
}

/// Creates a temporary catalog database and embedding artifact.
/// Returns (temp_dir, catalog_db_path, embeddings_db_path)
pub fn create_test_catalog() -> Result<(TempDir, PathBuf, PathBuf)> {
    let dir = TempDir::new()?;

    let catalog_db_path = dir.path().join("catalog.db");
    let conn = create_catalog_db(&catalog_db_path)?;
    for issue in fixture_issues() {
        insert_issue(&conn, &issue)?;
    }
    drop(conn);

    let embeddings_db_path = dir.path().join("embeddings.db");
    let writer = EmbeddingArtifactWriter::create(&embeddings_db_path, 2, EMBEDDING_MODEL)?;
    writer.add(FF_SERIES_ID, "Fantastic Four", "A hero rises", &[1.0, 0.0])?;
    writer.add(JIM_SERIES_ID, "Journey into Mystery", "A god falls", &[0.8, 0.6])?;
    writer.add(
        FFU_SERIES_ID,
        "Fantastic Four Unlimited",
        "A family fights",
        &[0.0, 1.0],
    )?;
    drop(writer);

    Ok((dir, catalog_db_path, embeddings_db_path))
}

/// Starts a fake embedding service answering every request with
/// [`LIVE_EMBEDDING`]. Returns its base URL.
pub async fn spawn_embedding_service() -> Result<String> {
    let app = Router::new().route(
        "/embed",
        post(|| async { Json(serde_json::json!({ "embedding": LIVE_EMBEDDING })) }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}", addr))
}
