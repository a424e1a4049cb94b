use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{debug, info};

use crate::catalog::{Dataset, Issue, IssueStore};
use crate::recommend::RecommendationError;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{http_cache, log_requests, metrics, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
}

#[derive(Serialize)]
struct CatalogStats {
    pub original_issues: usize,
    pub variant_issues: usize,
    pub original_series_titles: usize,
    pub variant_series_titles: usize,
    pub series: usize,
    pub summary_vectors: usize,
    pub embedding_model: Option<String>,
}

#[derive(Deserialize, Debug)]
struct IssueQuery {
    pub is_variant: Option<bool>,
}

const DEFAULT_LISTING_LIMIT: usize = 50;

#[derive(Deserialize, Debug)]
struct ListingQuery {
    pub prefix: Option<String>,
    pub limit: Option<usize>,
}

impl ListingQuery {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LISTING_LIMIT)
    }
}

#[derive(Serialize)]
struct SeriesTitles<'a> {
    pub series_titles: Vec<&'a str>,
}

#[derive(Serialize)]
struct CreatorCredits<'a> {
    pub creators: Vec<&'a str>,
}

#[derive(Serialize)]
struct VariantEntry<'a> {
    #[serde(flatten)]
    pub issue: &'a Issue,
    pub is_original_variant: bool,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn not_found(endpoint: &str, detail: String) -> Response {
    debug!("{}: {}", endpoint, detail);
    metrics::record_error("not_found", endpoint);
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "detail": detail })),
    )
        .into_response()
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    Json(stats)
}

async fn get_issue(
    State(store): State<GuardedIssueStore>,
    Path(id): Path<i64>,
    Query(query): Query<IssueQuery>,
) -> Response {
    let issue = match query.is_variant {
        Some(is_variant) => store.get_issue_in(Dataset::from_variant_flag(is_variant), id),
        None => store.get_issue(id),
    };
    match (issue, query.is_variant) {
        (Some(issue), _) => Json(issue).into_response(),
        (None, Some(is_variant)) => not_found(
            "/v1/issues/{id}",
            format!(
                "Issue ID {} not found in {} dataset",
                id,
                Dataset::from_variant_flag(is_variant)
            ),
        ),
        (None, None) => not_found(
            "/v1/issues/{id}",
            RecommendationError::IssueNotFound(id).to_string(),
        ),
    }
}

async fn get_issue_variants(
    State(store): State<GuardedIssueStore>,
    Path(id): Path<i64>,
) -> Response {
    let original = match store.get_issue_in(Dataset::Original, id) {
        Some(original) => original,
        None => {
            return not_found(
                "/v1/issues/{id}/variants",
                format!("Original issue ID {} not found", id),
            )
        }
    };

    let entries: Vec<VariantEntry> = std::iter::once(VariantEntry {
        issue: original,
        is_original_variant: true,
    })
    .chain(store.get_variants(id).into_iter().map(|issue| VariantEntry {
        issue,
        is_original_variant: false,
    }))
    .collect();
    Json(entries).into_response()
}

async fn get_original_issue(
    State(store): State<GuardedIssueStore>,
    Path(id): Path<i64>,
) -> Response {
    const ENDPOINT: &str = "/v1/issues/{id}/original";

    let variant = match store.get_issue_in(Dataset::Variant, id) {
        Some(variant) => variant,
        None => return not_found(ENDPOINT, format!("Variant issue ID {} not found", id)),
    };
    let original_id = match variant.original_issue_id {
        Some(original_id) => original_id,
        None => {
            return not_found(
                ENDPOINT,
                format!("Variant issue ID {} has no original issue", id),
            )
        }
    };

    match store.get_issue_in(Dataset::Original, original_id) {
        Some(original) => Json(original).into_response(),
        None => not_found(
            ENDPOINT,
            format!("Original issue ID {} not found", original_id),
        ),
    }
}

async fn get_recommendations(
    State(engine): State<GuardedRecommendationEngine>,
    Path(id): Path<i64>,
) -> Response {
    match engine.recommend(id).await {
        Ok(recommendations) => Json(recommendations).into_response(),
        Err(err @ RecommendationError::IssueNotFound(_)) => {
            not_found("/v1/issues/{id}/recommendations", err.to_string())
        }
    }
}

async fn list_series_titles(
    State(store): State<GuardedIssueStore>,
    Query(query): Query<ListingQuery>,
) -> Response {
    let series_titles = store.list_series_titles(query.prefix.as_deref(), query.limit());
    Json(SeriesTitles { series_titles }).into_response()
}

async fn list_creators(
    State(store): State<GuardedIssueStore>,
    Query(query): Query<ListingQuery>,
) -> Response {
    let creators = store.list_creators(query.prefix.as_deref(), query.limit());
    Json(CreatorCredits { creators }).into_response()
}

async fn get_stats(State(state): State<ServerState>) -> impl IntoResponse {
    let store = &state.issue_store;
    let index = state.engine.summary_index();
    Json(CatalogStats {
        original_issues: store.count(Dataset::Original),
        variant_issues: store.count(Dataset::Variant),
        original_series_titles: store.distinct_series_titles(Dataset::Original),
        variant_series_titles: store.distinct_series_titles(Dataset::Variant),
        series: state.engine.series().len(),
        summary_vectors: index.len(),
        embedding_model: index.model().map(String::from),
    })
}

pub fn make_app(
    config: ServerConfig,
    issue_store: GuardedIssueStore,
    engine: GuardedRecommendationEngine,
) -> Router {
    let state = ServerState::new(config.clone(), issue_store, engine);

    let issue_routes: Router = Router::new()
        .route("/{id}", get(get_issue))
        .route("/{id}/variants", get(get_issue_variants))
        .route("/{id}/original", get(get_original_issue))
        .route("/{id}/recommendations", get(get_recommendations))
        .layer(middleware::from_fn_with_state(
            config.content_cache_age_sec,
            http_cache,
        ))
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .route("/v1/stats", get(get_stats))
        .route("/v1/series", get(list_series_titles))
        .route("/v1/creators", get(list_creators))
        .with_state(state.clone());

    home_router
        .nest("/v1/issues", issue_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics::metrics_handler))
}

/// Serve the API on `config.port` and Prometheus metrics on `config.metrics_port`.
pub async fn run_server(
    config: ServerConfig,
    issue_store: GuardedIssueStore,
    engine: GuardedRecommendationEngine,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, issue_store, engine);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    tokio::try_join!(
        async { axum::serve(listener, app).await.context("API server failed") },
        async {
            axum::serve(metrics_listener, make_metrics_app())
                .await
                .context("Metrics server failed")
        },
    )?;
    Ok(())
}
