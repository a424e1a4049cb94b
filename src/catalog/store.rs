//! Issue storage.
//!
//! The catalog is read once at startup into an immutable [`IssueCatalog`];
//! nothing mutates it afterwards, so it is shared without locks.

use super::models::{parse_release_date, Dataset, Issue};
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use crate::sqlite_persistence::ensure_schema;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OpenFlags};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

/// Read access to the loaded issues.
pub trait IssueStore: Send + Sync {
    /// Resolve an issue, looking in the original partition first.
    fn get_issue(&self, issue_id: i64) -> Option<&Issue>;

    /// Resolve an issue within one partition only.
    fn get_issue_in(&self, dataset: Dataset, issue_id: i64) -> Option<&Issue>;

    /// Variants pointing at the given original issue, in storage order.
    fn get_variants(&self, original_issue_id: i64) -> Vec<&Issue>;

    /// All issues in storage order, originals first.
    fn issues(&self) -> &[Issue];

    fn count(&self, dataset: Dataset) -> usize;

    /// Number of distinct non-blank series titles within a partition.
    fn distinct_series_titles(&self, dataset: Dataset) -> usize;

    /// Distinct series titles, originals before variants, optionally
    /// restricted to a case-insensitive prefix.
    fn list_series_titles(&self, prefix: Option<&str>, limit: usize) -> Vec<&str>;

    /// Distinct raw creator credits, listed like [`IssueStore::list_series_titles`].
    fn list_creators(&self, prefix: Option<&str>, limit: usize) -> Vec<&str>;
}

pub struct IssueCatalog {
    issues: Vec<Issue>,
    by_key: HashMap<(Dataset, i64), usize>,
    variants_by_original: HashMap<i64, Vec<usize>>,
}

impl IssueCatalog {
    /// Build the catalog from issues in storage order.
    ///
    /// A repeated `(dataset, issue_id)` keeps its first occurrence.
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let mut kept = Vec::with_capacity(issues.len());
        let mut by_key = HashMap::with_capacity(issues.len());
        let mut variants_by_original: HashMap<i64, Vec<usize>> = HashMap::new();

        for issue in issues {
            let key = (issue.dataset, issue.issue_id);
            if by_key.contains_key(&key) {
                warn!(
                    "Skipping duplicate {} issue {}",
                    issue.dataset, issue.issue_id
                );
                continue;
            }
            let index = kept.len();
            by_key.insert(key, index);
            if let (Dataset::Variant, Some(original_id)) = (issue.dataset, issue.original_issue_id)
            {
                variants_by_original
                    .entry(original_id)
                    .or_default()
                    .push(index);
            }
            kept.push(issue);
        }

        IssueCatalog {
            issues: kept,
            by_key,
            variants_by_original,
        }
    }

    /// First-seen distinct non-blank values of one field, originals first.
    fn distinct_values<'a, F>(
        &'a self,
        field: F,
        prefix: Option<&str>,
        limit: usize,
    ) -> Vec<&'a str>
    where
        F: Fn(&'a Issue) -> Option<&'a str>,
    {
        let prefix = prefix.map(str::to_lowercase).filter(|p| !p.is_empty());
        let mut seen = HashSet::new();
        Dataset::RESOLUTION_ORDER
            .iter()
            .flat_map(|dataset| self.issues.iter().filter(move |i| i.dataset == *dataset))
            .filter_map(field)
            .filter(|value| !value.trim().is_empty())
            .filter(|value| match &prefix {
                Some(prefix) => value.to_lowercase().starts_with(prefix.as_str()),
                None => true,
            })
            .filter(|value| seen.insert(*value))
            .take(limit)
            .collect()
    }
}

impl IssueStore for IssueCatalog {
    fn get_issue(&self, issue_id: i64) -> Option<&Issue> {
        Dataset::RESOLUTION_ORDER
            .iter()
            .find_map(|dataset| self.get_issue_in(*dataset, issue_id))
    }

    fn get_issue_in(&self, dataset: Dataset, issue_id: i64) -> Option<&Issue> {
        self.by_key
            .get(&(dataset, issue_id))
            .map(|index| &self.issues[*index])
    }

    fn get_variants(&self, original_issue_id: i64) -> Vec<&Issue> {
        self.variants_by_original
            .get(&original_issue_id)
            .map(|indices| indices.iter().map(|i| &self.issues[*i]).collect())
            .unwrap_or_default()
    }

    fn issues(&self) -> &[Issue] {
        &self.issues
    }

    fn count(&self, dataset: Dataset) -> usize {
        self.issues.iter().filter(|i| i.dataset == dataset).count()
    }

    fn distinct_series_titles(&self, dataset: Dataset) -> usize {
        self.issues
            .iter()
            .filter(|i| i.dataset == dataset && !i.series_title.trim().is_empty())
            .map(|i| i.series_title.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    fn list_series_titles(&self, prefix: Option<&str>, limit: usize) -> Vec<&str> {
        self.distinct_values(|i| Some(i.series_title.as_str()), prefix, limit)
    }

    fn list_creators(&self, prefix: Option<&str>, limit: usize) -> Vec<&str> {
        self.distinct_values(|i| i.creators.as_deref(), prefix, limit)
    }
}

/// Create (or open and validate) a writable catalog database.
pub fn create_catalog_db<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let conn = Connection::open(path.as_ref())
        .with_context(|| format!("Failed to open catalog database {:?}", path.as_ref()))?;
    ensure_schema(&conn, CATALOG_VERSIONED_SCHEMAS, true)?;
    Ok(conn)
}

/// Insert one issue into a catalog database created by [`create_catalog_db`].
pub fn insert_issue(conn: &Connection, issue: &Issue) -> Result<()> {
    conn.execute(
        "INSERT INTO issues (issue_id, dataset, series_id, series_title, creators, summary, release_date, image, original_issue_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            issue.issue_id,
            issue.dataset.as_str(),
            issue.series_id,
            issue.series_title,
            issue.creators,
            issue.summary,
            issue.release_date.map(|d| d.format("%Y-%m-%d").to_string()),
            issue.image,
            issue.original_issue_id,
        ],
    )
    .with_context(|| format!("Failed to insert issue {}", issue.issue_id))?;
    Ok(())
}

/// Load every issue from the catalog database at `path`.
pub fn load_issue_catalog<P: AsRef<Path>>(path: P) -> Result<IssueCatalog> {
    let path = path.as_ref();
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open catalog database {:?}", path))?;
    ensure_schema(&conn, CATALOG_VERSIONED_SCHEMAS, false)
        .with_context(|| format!("Invalid catalog database {:?}", path))?;

    let mut stmt = conn.prepare(
        "SELECT issue_id, dataset, series_id, series_title, creators, summary, release_date, image, original_issue_id
         FROM issues
         ORDER BY CASE dataset WHEN 'original' THEN 0 ELSE 1 END, rowid",
    )?;

    let mut issues = Vec::new();
    let mut skipped = 0usize;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<i64>>(8)?,
        ))
    })?;

    for row in rows {
        let (
            issue_id,
            dataset,
            series_id,
            series_title,
            creators,
            summary,
            release_date,
            image,
            original_issue_id,
        ) = row?;
        let dataset = match Dataset::parse(&dataset) {
            Some(dataset) => dataset,
            None => {
                skipped += 1;
                continue;
            }
        };
        issues.push(Issue {
            issue_id,
            dataset,
            series_id,
            series_title,
            creators,
            summary,
            release_date: release_date.as_deref().and_then(parse_release_date),
            image,
            original_issue_id,
        });
    }

    if skipped > 0 {
        warn!("Skipped {} issues with an unknown dataset value", skipped);
    }

    let catalog = IssueCatalog::from_issues(issues);
    info!(
        "Loaded issue catalog: {} original issues, {} variants",
        catalog.count(Dataset::Original),
        catalog.count(Dataset::Variant)
    );
    Ok(catalog)
}
