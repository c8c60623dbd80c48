use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::time::Instant;

use crate::{GatewayError, Result};

lazy_static! {
    // Request metrics
    pub static ref REQUEST_COUNTER: IntCounterVec = register_int_counter_vec!(
        "gateway_requests_total",
        "Total number of API requests received",
        &["endpoint"]
    ).unwrap();

    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "gateway_request_duration_seconds",
        "API request duration in seconds",
        &["endpoint"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]
    ).unwrap();

    // Backend metrics
    pub static ref BACKEND_QUERIES: IntCounterVec = register_int_counter_vec!(
        "gateway_backend_queries_total",
        "Total number of queries sent to the metrics backend",
        &["kind"]
    ).unwrap();

    pub static ref BACKEND_QUERY_FAILURES: IntCounterVec = register_int_counter_vec!(
        "gateway_backend_query_failures_total",
        "Backend queries that failed before a usable envelope was decoded",
        &["kind", "reason"]
    ).unwrap();

    pub static ref BACKEND_QUERY_DURATION: HistogramVec = register_histogram_vec!(
        "gateway_backend_query_duration_seconds",
        "Round trip time of backend queries",
        &["kind"],
        vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]
    ).unwrap();
}

/// Counts a request on creation and records its latency when dropped.
pub struct RequestTimer {
    endpoint: &'static str,
    start: Instant,
}

impl RequestTimer {
    pub fn new(endpoint: &'static str) -> Self {
        REQUEST_COUNTER.with_label_values(&[endpoint]).inc();
        Self {
            endpoint,
            start: Instant::now(),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        REQUEST_DURATION
            .with_label_values(&[self.endpoint])
            .observe(duration);
    }
}

pub struct BackendQueryTimer {
    kind: String,
    start: Instant,
}

impl BackendQueryTimer {
    pub fn new(kind: &str) -> Self {
        BACKEND_QUERIES.with_label_values(&[kind]).inc();
        Self {
            kind: kind.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for BackendQueryTimer {
    fn drop(&mut self) {
        BACKEND_QUERY_DURATION
            .with_label_values(&[&self.kind])
            .observe(self.start.elapsed().as_secs_f64());
    }
}

pub fn record_backend_failure(kind: &str, err: &GatewayError) {
    BACKEND_QUERY_FAILURES
        .with_label_values(&[kind, err.reason()])
        .inc();
}

/// Renders every registered metric in the text exposition format.
pub fn render() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| GatewayError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| GatewayError::Internal(format!("Metrics are not valid UTF-8: {}", e)))
}
