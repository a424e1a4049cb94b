use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all catalog server metrics
const PREFIX: &str = "comics";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Recommendation Metrics
    pub static ref RECOMMENDATION_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_recommendation_duration_seconds"),
            "Time to compute all recommendation signals for one issue"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0])
    ).expect("Failed to create recommendation_duration_seconds metric");

    pub static ref RECOMMENDATION_EMPTY_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_recommendation_empty_total"),
            "Recommendation signals that produced no match"
        ),
        &["signal"]
    ).expect("Failed to create recommendation_empty_total metric");

    pub static ref RECOMMENDATION_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_recommendation_failures_total"),
            "Recommendation signals that failed and were reported empty"
        ),
        &["signal", "reason"]
    ).expect("Failed to create recommendation_failures_total metric");

    // Catalog Metrics
    pub static ref CATALOG_ITEMS_TOTAL: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_catalog_items_total"), "Total items in catalog"),
        &["type"]
    ).expect("Failed to create catalog_items_total metric");

    // Error Metrics
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_errors_total"), "Total errors by type and endpoint"),
        &["error_type", "endpoint"]
    ).expect("Failed to create errors_total metric");

    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(RECOMMENDATION_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(RECOMMENDATION_EMPTY_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(RECOMMENDATION_FAILURES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_ITEMS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Initialize catalog-specific metrics
pub fn init_catalog_metrics(
    num_original_issues: usize,
    num_variant_issues: usize,
    num_series: usize,
    num_summary_vectors: usize,
) {
    CATALOG_ITEMS_TOTAL
        .with_label_values(&["original_issue"])
        .set(num_original_issues as f64);

    CATALOG_ITEMS_TOTAL
        .with_label_values(&["variant_issue"])
        .set(num_variant_issues as f64);

    CATALOG_ITEMS_TOTAL
        .with_label_values(&["series"])
        .set(num_series as f64);

    CATALOG_ITEMS_TOTAL
        .with_label_values(&["summary_vector"])
        .set(num_summary_vectors as f64);

    tracing::info!(
        "Catalog metrics initialized: {} original issues, {} variants, {} series, {} summary vectors",
        num_original_issues,
        num_variant_issues,
        num_series,
        num_summary_vectors
    );
}

/// Collapse a request path into its route, keeping label cardinality bounded.
pub fn categorize_endpoint(path: &str) -> &'static str {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match segments.as_slice() {
        [""] => "/",
        ["v1", "stats"] => "/v1/stats",
        ["v1", "series"] => "/v1/series",
        ["v1", "creators"] => "/v1/creators",
        ["v1", "issues", _] => "/v1/issues/{id}",
        ["v1", "issues", _, "variants"] => "/v1/issues/{id}/variants",
        ["v1", "issues", _, "original"] => "/v1/issues/{id}/original",
        ["v1", "issues", _, "recommendations"] => "/v1/issues/{id}/recommendations",
        _ => "other",
    }
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let endpoint = categorize_endpoint(path);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, endpoint])
        .observe(duration.as_secs_f64());
}

/// Record how long one full recommendation took
pub fn record_recommendation(duration: Duration) {
    RECOMMENDATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a signal that produced an empty list
pub fn record_signal_empty(signal: &str) {
    RECOMMENDATION_EMPTY_TOTAL.with_label_values(&[signal]).inc();
}

/// Record a signal that failed
pub fn record_signal_failure(signal: &str, reason: &str) {
    RECOMMENDATION_FAILURES_TOTAL
        .with_label_values(&[signal, reason])
        .inc();
}

/// Record an error
pub fn record_error(error_type: &str, endpoint: &str) {
    ERRORS_TOTAL
        .with_label_values(&[error_type, endpoint])
        .inc();
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let rss_kb = status
                .lines()
                .find(|line| line.starts_with("VmRSS:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<f64>().ok());
            if let Some(kb) = rss_kb {
                PROCESS_MEMORY_BYTES.set(kb * 1024.0);
            }
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    // Update memory usage before returning metrics
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
