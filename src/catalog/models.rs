use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Partition an issue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Original,
    Variant,
}

impl Dataset {
    /// Lookup order used when resolving an issue by id.
    pub const RESOLUTION_ORDER: [Dataset; 2] = [Dataset::Original, Dataset::Variant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Original => "original",
            Dataset::Variant => "variant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "original" => Some(Dataset::Original),
            "variant" => Some(Dataset::Variant),
            _ => None,
        }
    }

    pub fn from_variant_flag(is_variant: bool) -> Self {
        if is_variant {
            Dataset::Variant
        } else {
            Dataset::Original
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single comic issue as loaded from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub issue_id: i64,
    pub dataset: Dataset,
    pub series_id: i64,
    pub series_title: String,
    pub creators: Option<String>,
    pub summary: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub image: Option<String>,
    /// Set on variants only.
    pub original_issue_id: Option<i64>,
}

impl Issue {
    pub fn is_variant(&self) -> bool {
        self.dataset == Dataset::Variant
    }
}

/// A series aggregated from all of its issues.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub series_id: i64,
    pub title: String,
    /// Case-folded authorial creator names across every issue.
    pub creators: BTreeSet<String>,
    /// Image of the earliest released issue that has one.
    pub cover_image: Option<String>,
    pub issue_count: usize,
}

/// Parse a release date, treating anything unreadable as absent.
///
/// Accepts plain `YYYY-MM-DD` and anything that starts with it, such as
/// `2011-03-02 00:00:00` or `2011-03-02T00:00:00Z`.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
