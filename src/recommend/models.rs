use serde::{Deserialize, Serialize};

/// A series sharing authorial creators with the query issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorMatch {
    pub series_id: i64,
    pub series_title: String,
    pub image: Option<String>,
    /// Number of shared creators.
    pub match_score: u32,
}

/// A series whose best summary is close to the query issue's summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMatch {
    pub series_id: i64,
    pub series_title: String,
    pub image: Option<String>,
    /// Cosine similarity, roughly in [-1, 1]. Only meaningful for ranking.
    pub similarity_score: f32,
}

/// A series whose title fuzzily matches the query issue's series title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleMatch {
    pub series_id: i64,
    pub series_title: String,
    pub image: Option<String>,
    /// Token-set similarity, 0 to 100.
    pub match_score: u8,
}

/// Three independently ranked lists, never merged into one score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub same_creators: Vec<CreatorMatch>,
    pub from_summary: Vec<SummaryMatch>,
    pub title_similarity: Vec<TitleMatch>,
}
