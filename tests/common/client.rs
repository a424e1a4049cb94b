//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per catalog-server endpoint.
//! When API routes change, update only this file.

use super::constants::*;
use reqwest::Response;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Issue Endpoints
    // ========================================================================

    /// GET /v1/issues/{id}
    pub async fn get_issue(&self, issue_id: i64) -> Response {
        self.get(&format!("/v1/issues/{}", issue_id)).await
    }

    /// GET /v1/issues/{id}?is_variant={is_variant}
    pub async fn get_issue_in(&self, issue_id: i64, is_variant: bool) -> Response {
        self.get(&format!("/v1/issues/{}?is_variant={}", issue_id, is_variant))
            .await
    }

    /// GET /v1/issues/{id}/variants
    pub async fn get_issue_variants(&self, issue_id: i64) -> Response {
        self.get(&format!("/v1/issues/{}/variants", issue_id)).await
    }

    /// GET /v1/issues/{id}/original
    pub async fn get_original_issue(&self, issue_id: i64) -> Response {
        self.get(&format!("/v1/issues/{}/original", issue_id)).await
    }

    /// GET /v1/issues/{id}/recommendations
    pub async fn get_recommendations(&self, issue_id: i64) -> Response {
        self.get(&format!("/v1/issues/{}/recommendations", issue_id))
            .await
    }

    // ========================================================================
    // Listing Endpoints
    // ========================================================================

    /// GET /v1/series?prefix={prefix}
    pub async fn list_series(&self, prefix: Option<&str>) -> Response {
        self.client
            .get(format!("{}/v1/series", self.base_url))
            .query(&[("prefix", prefix)])
            .send()
            .await
            .expect("Request failed")
    }

    /// GET /v1/creators?prefix={prefix}&limit={limit}
    pub async fn list_creators(&self, prefix: &str, limit: usize) -> Response {
        self.client
            .get(format!("{}/v1/creators", self.base_url))
            .query(&[("prefix", prefix.to_string()), ("limit", limit.to_string())])
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Server Endpoints
    // ========================================================================

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.get("/").await
    }

    /// GET /v1/stats
    pub async fn get_stats(&self) -> Response {
        self.get("/v1/stats").await
    }
}
