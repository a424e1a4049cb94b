//! SQLite schema of the issue catalog database.
//!
//! Both partitions live in one `issues` table, told apart by `dataset`.
//! Dates are ISO `YYYY-MM-DD` text.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const ISSUES_TABLE: Table = Table {
    name: "issues",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("issue_id", &SqlType::Integer, non_null = true),
        sqlite_column!("dataset", &SqlType::Text, non_null = true), // 'original' | 'variant'
        sqlite_column!("series_id", &SqlType::Integer, non_null = true),
        sqlite_column!("series_title", &SqlType::Text, non_null = true),
        sqlite_column!("creators", &SqlType::Text),
        sqlite_column!("summary", &SqlType::Text),
        sqlite_column!("release_date", &SqlType::Text),
        sqlite_column!("image", &SqlType::Text),
        sqlite_column!("original_issue_id", &SqlType::Integer),
    ],
    indices: &[
        ("idx_issues_series", "series_id"),
        ("idx_issues_original", "original_issue_id"),
    ],
    unique_constraints: &[&["dataset", "issue_id"]],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[ISSUES_TABLE],
}];
