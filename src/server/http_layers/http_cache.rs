//! HTTP caching middleware

use axum::{
    body::Body,
    extract::State,
    http::{header::CACHE_CONTROL, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Marks every response of the wrapped routes cacheable for `max_age_sec`.
pub async fn http_cache(
    State(max_age_sec): State<usize>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&format!("max-age={}", max_age_sec)) {
        response.headers_mut().insert(CACHE_CONTROL, value);
    }
    response
}
