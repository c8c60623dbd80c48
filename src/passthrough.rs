use tracing::info;

use crate::backend::{BackendEnvelope, PrometheusClient, RangeWindow};
use crate::models::{CustomQueryRequest, QueryType};
use crate::{GatewayError, Result};

/// Runs a caller supplied expression and returns the backend envelope as is,
/// including `status=error` replies. Range queries use the dashboard window.
pub async fn execute(client: &PrometheusClient, request: &CustomQueryRequest) -> Result<BackendEnvelope> {
    if request.query.is_empty() {
        return Err(GatewayError::validation("Query parameter is required"));
    }

    info!(query = %request.query, kind = ?request.query_type, "custom query");
    match request.query_type {
        QueryType::Instant => client.query_instant(&request.query).await,
        QueryType::Range => client.query_range(&request.query, RangeWindow::dashboard()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::QueryStatus;
    use crate::test_support::FakePrometheus;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn empty_query_is_rejected_without_backend_call() {
        let fake = FakePrometheus::start().await;
        let client = PrometheusClient::new(fake.url());

        let err = execute(&client, &CustomQueryRequest::default()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn instant_is_the_default() {
        let fake = FakePrometheus::start().await;
        let client = PrometheusClient::new(fake.url());

        let request = CustomQueryRequest {
            query: "up".into(),
            ..Default::default()
        };
        let envelope = execute(&client, &request).await.unwrap();
        assert_eq!(envelope.status, QueryStatus::Success);
        assert_eq!(fake.calls()[0].path, "/api/v1/query");
    }

    #[tokio::test]
    async fn range_uses_trailing_five_minutes() {
        let fake = FakePrometheus::start().await;
        let client = PrometheusClient::new(fake.url());

        let request = CustomQueryRequest {
            query: "rate(http_requests_total[1m])".into(),
            query_type: QueryType::Range,
        };
        execute(&client, &request).await.unwrap();

        let calls = fake.calls();
        let call = &calls[0];
        assert_eq!(call.path, "/api/v1/query_range");
        let start: i64 = call.param("start").unwrap().parse().unwrap();
        let end: i64 = call.param("end").unwrap().parse().unwrap();
        assert_eq!(end - start, 300);
        assert_eq!(call.param("step"), Some("15"));
    }

    #[tokio::test]
    async fn backend_error_envelope_is_returned_not_raised() {
        let fake = FakePrometheus::start().await;
        fake.respond_with(400, r#"{"status":"error","errorType":"bad_data","error":"parse error"}"#);
        let client = PrometheusClient::new(fake.url());

        let request = CustomQueryRequest {
            query: "sum(".into(),
            ..Default::default()
        };
        let envelope = execute(&client, &request).await.unwrap();
        assert_eq!(envelope.status, QueryStatus::Error);
        assert_eq!(envelope.error.as_deref(), Some("parse error"));
    }
}
