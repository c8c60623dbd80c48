use tracing::{debug, warn};

use super::envelope::BackendEnvelope;
use crate::{metrics, Result};

/// Span covered by dashboard range queries, in seconds.
pub const DASHBOARD_WINDOW_SECS: i64 = 300;
/// Resolution of dashboard range queries, in seconds.
pub const DASHBOARD_STEP_SECS: i64 = 15;

/// Evaluation bounds of a range query. Unrelated to the `[5m]` rate window
/// inside the expression itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWindow {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl RangeWindow {
    /// The trailing `span` seconds ending at `end`.
    pub fn trailing(end: i64, span: i64, step: i64) -> Self {
        Self {
            start: end - span,
            end,
            step,
        }
    }

    /// The last five minutes at 15s resolution, ending now.
    pub fn dashboard() -> Self {
        Self::trailing(
            chrono::Utc::now().timestamp(),
            DASHBOARD_WINDOW_SECS,
            DASHBOARD_STEP_SECS,
        )
    }
}

/// Client for the Prometheus HTTP query API.
///
/// Transport failures and undecodable bodies are errors; a well-formed
/// `status=error` reply is returned as a normal envelope.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    base_url: String,
    http: reqwest::Client,
}

impl PrometheusClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn query_instant(&self, query: &str) -> Result<BackendEnvelope> {
        debug!(query, "instant query");
        let url = format!("{}/api/v1/query", self.base_url);
        self.execute("instant", self.http.get(&url).query(&[("query", query)]))
            .await
    }

    pub async fn query_range(&self, query: &str, window: RangeWindow) -> Result<BackendEnvelope> {
        debug!(query, start = window.start, end = window.end, step = window.step, "range query");
        let url = format!("{}/api/v1/query_range", self.base_url);
        let request = self.http.get(&url).query(&[
            ("query", query.to_string()),
            ("start", window.start.to_string()),
            ("end", window.end.to_string()),
            ("step", window.step.to_string()),
        ]);
        self.execute("range", request).await
    }

    async fn execute(&self, kind: &str, request: reqwest::RequestBuilder) -> Result<BackendEnvelope> {
        let timer = metrics::BackendQueryTimer::new(kind);
        let result = fetch(request).await;

        if let Err(e) = &result {
            warn!(kind, error = %e, "backend query failed");
            metrics::record_backend_failure(kind, e);
        }
        drop(timer);
        result
    }
}

async fn fetch(request: reqwest::RequestBuilder) -> Result<BackendEnvelope> {
    let response = request.send().await?;
    let body = response.text().await?;
    BackendEnvelope::from_json(&body)
}

impl From<&crate::config::GatewayConfig> for PrometheusClient {
    fn from(cfg: &crate::config::GatewayConfig) -> Self {
        PrometheusClient::new(cfg.prometheus_url.clone())
    }
}
