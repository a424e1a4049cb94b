//! Persisted summary embeddings.
//!
//! The artifact is a SQLite database produced by an offline batch job. It
//! must be rebuilt whenever the summary corpus changes; nothing here can
//! detect a stale artifact.

use super::index::{EmbeddingEntry, SummaryIndex};
use crate::sqlite_column;
use crate::sqlite_persistence::{ensure_schema, Column, SqlType, Table, VersionedSchema};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use tracing::info;

const SUMMARY_EMBEDDINGS_TABLE: Table = Table {
    name: "summary_embeddings",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("series_id", &SqlType::Integer, non_null = true),
        sqlite_column!("series_title", &SqlType::Text, non_null = true),
        sqlite_column!("summary", &SqlType::Text, non_null = true),
        sqlite_column!("vector", &SqlType::Blob, non_null = true), // little-endian f32
    ],
    indices: &[("idx_summary_embeddings_series", "series_id")],
    unique_constraints: &[],
};

const ARTIFACT_METADATA_TABLE: Table = Table {
    name: "artifact_metadata",
    columns: &[
        sqlite_column!("key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("value", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const EMBEDDINGS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[SUMMARY_EMBEDDINGS_TABLE, ARTIFACT_METADATA_TABLE],
}];

const DIMENSION_KEY: &str = "dimension";
const MODEL_KEY: &str = "model";

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        bail!(
            "Embedding blob of {} bytes is not a whole number of f32 values",
            bytes.len()
        );
    }
    let vector: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    if vector.iter().any(|v| !v.is_finite()) {
        bail!("Embedding blob contains non-finite values");
    }
    Ok(vector)
}

fn read_metadata(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM artifact_metadata WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("Failed to read artifact metadata '{}'", key))
}

/// Load the artifact at `path` into a [`SummaryIndex`].
///
/// Any malformed vector makes the whole load fail.
pub fn load_summary_index<P: AsRef<Path>>(path: P) -> Result<SummaryIndex> {
    let path = path.as_ref();
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open embeddings database {:?}", path))?;
    ensure_schema(&conn, EMBEDDINGS_VERSIONED_SCHEMAS, false)
        .with_context(|| format!("Invalid embeddings database {:?}", path))?;

    let dimension: usize = match read_metadata(&conn, DIMENSION_KEY)? {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid artifact dimension '{}'", value))?,
        None => bail!("Embeddings database {:?} does not record a dimension", path),
    };
    let model = read_metadata(&conn, MODEL_KEY)?;

    let mut stmt = conn.prepare(
        "SELECT series_id, series_title, summary, vector FROM summary_embeddings ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Vec<u8>>(3)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (series_id, series_title, summary, blob) = row?;
        let vector = decode_vector(&blob)
            .with_context(|| format!("Bad embedding for series {}", series_id))?;
        entries.push(EmbeddingEntry {
            series_id,
            series_title,
            summary,
            vector,
        });
    }

    let index = SummaryIndex::new(dimension, model, entries)
        .with_context(|| format!("Inconsistent embeddings database {:?}", path))?;
    info!(
        "Loaded summary embeddings: {} vectors of dimension {} (model: {})",
        index.len(),
        index.dimension(),
        index.model().unwrap_or("unknown")
    );
    Ok(index)
}

/// Writes an embedding artifact.
pub struct EmbeddingArtifactWriter {
    conn: Connection,
    dimension: usize,
}

impl EmbeddingArtifactWriter {
    /// Create a new artifact at `path` recording `dimension` and `model`.
    pub fn create<P: AsRef<Path>>(path: P, dimension: usize, model: &str) -> Result<Self> {
        let path = path.as_ref();
        if dimension == 0 {
            bail!("Embedding dimension must be positive");
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to create embeddings database {:?}", path))?;
        ensure_schema(&conn, EMBEDDINGS_VERSIONED_SCHEMAS, true)?;
        conn.execute(
            "INSERT OR REPLACE INTO artifact_metadata (key, value) VALUES (?1, ?2), (?3, ?4)",
            params![DIMENSION_KEY, dimension.to_string(), MODEL_KEY, model],
        )?;
        Ok(EmbeddingArtifactWriter { conn, dimension })
    }

    pub fn add(
        &self,
        series_id: i64,
        series_title: &str,
        summary: &str,
        vector: &[f32],
    ) -> Result<()> {
        if vector.len() != self.dimension {
            bail!(
                "Embedding for series {} has {} dimensions, artifact expects {}",
                series_id,
                vector.len(),
                self.dimension
            );
        }
        if vector.iter().any(|v| !v.is_finite()) {
            bail!("Embedding for series {} has non-finite values", series_id);
        }
        self.conn.execute(
            "INSERT INTO summary_embeddings (series_id, series_title, summary, vector) VALUES (?1, ?2, ?3, ?4)",
            params![series_id, series_title, summary, encode_vector(vector)],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_and_loads_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embeddings.db");

        {
            let writer = EmbeddingArtifactWriter::create(&path, 3, "fixture-model").unwrap();
            writer
                .add(5, "Fantastic Four", "A hero rises", &[0.25, -1.5, 3.0])
                .unwrap();
            writer
                .add(9, "Thor", "A god falls", &[1.0, 0.0, 0.0])
                .unwrap();
        }

        let index = load_summary_index(&path).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.dimension(), 3);
        assert_eq!(index.model(), Some("fixture-model"));
        assert_eq!(
            index.stored_vector("A hero rises"),
            Some(&[0.25f32, -1.5, 3.0][..])
        );
        assert_eq!(index.series_title(9), Some("Thor"));
    }

    #[test]
    fn writer_rejects_wrong_dimension() {
        let dir = TempDir::new().unwrap();
        let writer =
            EmbeddingArtifactWriter::create(dir.path().join("embeddings.db"), 2, "m").unwrap();
        assert!(writer.add(1, "X", "text", &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn load_fails_on_truncated_blob() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embeddings.db");
        {
            let writer = EmbeddingArtifactWriter::create(&path, 2, "m").unwrap();
            writer.add(1, "X", "fine", &[1.0, 2.0]).unwrap();
            writer
                .conn
                .execute(
                    "INSERT INTO summary_embeddings (series_id, series_title, summary, vector) VALUES (2, 'Y', 'broken', ?1)",
                    params![vec![0u8; 7]],
                )
                .unwrap();
        }

        let err = load_summary_index(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("not a whole number"));
    }

    #[test]
    fn load_fails_on_dimension_drift() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embeddings.db");
        {
            let writer = EmbeddingArtifactWriter::create(&path, 2, "m").unwrap();
            writer.add(1, "X", "fine", &[1.0, 2.0]).unwrap();
            writer
                .conn
                .execute(
                    "UPDATE artifact_metadata SET value = '3' WHERE key = 'dimension'",
                    [],
                )
                .unwrap();
        }

        assert!(load_summary_index(&path).is_err());
    }

    #[test]
    fn decodes_little_endian_floats() {
        let bytes = encode_vector(&[1.0, -2.5]);
        assert_eq!(&bytes[..4], &1.0f32.to_le_bytes()[..]);
        assert_eq!(decode_vector(&bytes).unwrap(), vec![1.0, -2.5]);
        assert!(decode_vector(&f32::NAN.to_le_bytes()).is_err());
    }
}
