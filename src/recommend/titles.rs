use super::fuzzy::{token_set_ratio, TokenSet};
use super::models::TitleMatch;
use crate::catalog::{Issue, SeriesCatalog};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

struct TitleCandidate {
    series_id: i64,
    title: String,
    tokens: TokenSet,
}

/// Fuzzy matches a series title against every known series title.
///
/// Candidates are tokenized once at construction, one per distinct
/// `(series_id, title)` pair, ordered by series id.
pub struct TitleSimilarityMatcher {
    candidates: Vec<TitleCandidate>,
    series: Arc<SeriesCatalog>,
}

impl TitleSimilarityMatcher {
    pub fn build<'a, I>(issues: I, series: Arc<SeriesCatalog>) -> Self
    where
        I: IntoIterator<Item = &'a Issue>,
    {
        let mut seen: HashSet<(i64, &str)> = HashSet::new();
        let mut candidates: Vec<TitleCandidate> = Vec::new();
        for issue in issues {
            if !seen.insert((issue.series_id, issue.series_title.as_str())) {
                continue;
            }
            let tokens = TokenSet::new(&issue.series_title);
            if tokens.is_empty() {
                continue;
            }
            candidates.push(TitleCandidate {
                series_id: issue.series_id,
                title: issue.series_title.clone(),
                tokens,
            });
        }
        candidates.sort_by_key(|c| c.series_id);

        Self { candidates, series }
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Rank series by title similarity to `title`, skipping `exclude_series`.
    ///
    /// A series with several titles is reported once, under its best one.
    pub fn match_title(
        &self,
        title: &str,
        exclude_series: i64,
        min_score: u8,
        max_results: usize,
    ) -> Vec<TitleMatch> {
        let query = TokenSet::new(title);
        if query.is_empty() {
            return Vec::new();
        }

        let mut best: BTreeMap<i64, (u8, &str)> = BTreeMap::new();
        for candidate in &self.candidates {
            if candidate.series_id == exclude_series {
                continue;
            }
            let score = token_set_ratio(&query, &candidate.tokens);
            if score < min_score {
                continue;
            }
            best.entry(candidate.series_id)
                .and_modify(|current| {
                    if score > current.0 {
                        *current = (score, candidate.title.as_str());
                    }
                })
                .or_insert((score, candidate.title.as_str()));
        }

        let mut matches: Vec<TitleMatch> = best
            .into_iter()
            .map(|(series_id, (score, title))| TitleMatch {
                series_id,
                series_title: title.to_string(),
                image: self
                    .series
                    .cover_image(series_id)
                    .map(|image| image.to_string()),
                match_score: score,
            })
            .collect();

        matches.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        matches.truncate(max_results);
        matches
    }

    pub fn score_issue(&self, issue: &Issue, min_score: u8, max_results: usize) -> Vec<TitleMatch> {
        self.match_title(&issue.series_title, issue.series_id, min_score, max_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Dataset;
    use crate::credits::DEFAULT_AUTHORIAL_ROLES;

    fn titled(issue_id: i64, series_id: i64, title: &str) -> Issue {
        Issue {
            issue_id,
            dataset: Dataset::Original,
            series_id,
            series_title: title.to_string(),
            creators: None,
            summary: None,
            release_date: None,
            image: Some(format!("http://img/{}.jpg", series_id)),
            original_issue_id: None,
        }
    }

    fn matcher(issues: &[Issue]) -> TitleSimilarityMatcher {
        let series = SeriesCatalog::build(issues, DEFAULT_AUTHORIAL_ROLES);
        TitleSimilarityMatcher::build(issues, Arc::new(series))
    }

    #[test]
    fn matches_punctuation_variant_of_title() {
        let issues = vec![
            titled(1, 1, "Amazing Spider-Man"),
            titled(2, 2, "The Amazing Spiderman"),
            titled(3, 3, "Tales of Suspense"),
        ];

        let matches = matcher(&issues).score_issue(&issues[0], 50, 20);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].series_id, 2);
        assert!(matches[0].match_score >= 80);
        assert_eq!(matches[0].image.as_deref(), Some("http://img/2.jpg"));
    }

    #[test]
    fn identical_title_scores_100_but_own_series_is_excluded() {
        let issues = vec![
            titled(1, 1, "Fantastic Four"),
            titled(2, 1, "Fantastic Four"),
            titled(3, 7, "Fantastic Four"),
        ];

        let matches = matcher(&issues).score_issue(&issues[0], 50, 20);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].series_id, 7);
        assert_eq!(matches[0].match_score, 100);
    }

    #[test]
    fn deduplicates_series_keeping_best_title() {
        let issues = vec![
            titled(1, 1, "Iron Man"),
            titled(2, 4, "Iron Fist"),
            titled(3, 4, "Iron Man Annual"),
        ];

        let matches = matcher(&issues).score_issue(&issues[0], 0, 20);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].series_title, "Iron Man Annual");
        assert_eq!(matches[0].match_score, 100);
    }

    #[test]
    fn applies_floor_and_sorts_descending() {
        let issues = vec![
            titled(1, 1, "Amazing Spider-Man"),
            titled(2, 2, "Spectacular Spider-Man"),
            titled(3, 3, "Amazing Spider-Man Family"),
            titled(4, 4, "Howard the Duck"),
        ];
        let matcher = matcher(&issues);

        let matches = matcher.score_issue(&issues[0], 50, 20);
        let ranked: Vec<(i64, u8)> = matches.iter().map(|m| (m.series_id, m.match_score)).collect();
        assert_eq!(ranked, vec![(3, 100), (2, 69)]);

        let strict = matcher.score_issue(&issues[0], 70, 20);
        assert_eq!(strict.len(), 1);
    }

    #[test]
    fn blank_title_yields_nothing() {
        let issues = vec![titled(1, 1, "  "), titled(2, 2, "Thor")];
        assert!(matcher(&issues).score_issue(&issues[0], 0, 20).is_empty());
    }

    #[test]
    fn caps_results_keeping_series_order_on_ties() {
        let mut issues = vec![titled(1, 0, "Star Wars")];
        for series_id in (1..=25).rev() {
            issues.push(titled(100 + series_id, series_id, "Star Wars"));
        }

        let matches = matcher(&issues).score_issue(&issues[0], 50, 20);
        assert_eq!(matches.len(), 20);
        assert_eq!(matches[0].series_id, 1);
        assert_eq!(matches[19].series_id, 20);
    }
}
