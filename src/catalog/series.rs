//! Per-series aggregates, built once from the full issue collection.

use super::models::{Issue, Series};
use crate::credits::authorial_creators;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::info;

/// Series keyed and enumerated by ascending series id.
#[derive(Debug, Default)]
pub struct SeriesCatalog {
    series: BTreeMap<i64, Series>,
}

struct SeriesBuilder {
    series: Series,
    cover_date: Option<NaiveDate>,
}

/// Dated issues sort before undated ones.
fn is_earlier(candidate: Option<NaiveDate>, current: Option<NaiveDate>) -> bool {
    match (candidate, current) {
        (Some(candidate), Some(current)) => candidate < current,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

impl SeriesCatalog {
    /// Aggregate `issues` (storage order) into series.
    ///
    /// `roles` selects which credited roles count as authorial.
    pub fn build<'a, I, S>(issues: I, roles: &[S]) -> Self
    where
        I: IntoIterator<Item = &'a Issue>,
        S: AsRef<str>,
    {
        let mut builders: BTreeMap<i64, SeriesBuilder> = BTreeMap::new();

        for issue in issues {
            let builder = builders
                .entry(issue.series_id)
                .or_insert_with(|| SeriesBuilder {
                    series: Series {
                        series_id: issue.series_id,
                        title: issue.series_title.clone(),
                        creators: Default::default(),
                        cover_image: None,
                        issue_count: 0,
                    },
                    cover_date: None,
                });

            builder.series.issue_count += 1;
            builder
                .series
                .creators
                .extend(authorial_creators(issue.creators.as_deref(), roles));

            if let Some(image) = issue.image.as_ref().filter(|i| !i.trim().is_empty()) {
                if builder.series.cover_image.is_none()
                    || is_earlier(issue.release_date, builder.cover_date)
                {
                    builder.series.cover_image = Some(image.clone());
                    builder.cover_date = issue.release_date;
                }
            }
        }

        let series: BTreeMap<i64, Series> = builders
            .into_iter()
            .map(|(id, builder)| (id, builder.series))
            .collect();

        info!(
            "Built series catalog: {} series, {} with authorial credits",
            series.len(),
            series.values().filter(|s| !s.creators.is_empty()).count()
        );

        SeriesCatalog { series }
    }

    pub fn get(&self, series_id: i64) -> Option<&Series> {
        self.series.get(&series_id)
    }

    /// Series in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn title(&self, series_id: i64) -> Option<&str> {
        self.get(series_id).map(|s| s.title.as_str())
    }

    pub fn cover_image(&self, series_id: i64) -> Option<&str> {
        self.get(series_id).and_then(|s| s.cover_image.as_deref())
    }
}
