use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    backend::{BackendEnvelope, PrometheusClient, RangeWindow},
    config::GatewayConfig,
    discovery::{self, Dimension},
    metrics::{self, RequestTimer},
    models::{
        ContainersParams, ContainersResponse, CustomQueryRequest, DeploymentsParams,
        DeploymentsResponse, HealthResponse, MetricQueryRequest, MetricsResponse,
        NamespacesResponse,
    },
    normalize::normalize,
    passthrough,
    query_builder, GatewayError, Result,
};

#[derive(Clone)]
pub struct GatewayState {
    pub client: PrometheusClient,
    pub config: Arc<GatewayConfig>,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: PrometheusClient::from(&config),
            config: Arc::new(config),
        }
    }
}

pub fn gateway_router(state: GatewayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/namespaces", get(list_namespaces))
        .route("/api/deployments", get(list_deployments))
        .route("/api/containers", get(list_containers))
        .route("/api/metrics", get(get_metrics))
        .route("/api/query", post(custom_query))
        .route("/health", get(health))
        .route("/metrics", get(gateway_metrics))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Returns `value` if present and non-empty.
fn required<'a>(value: &'a Option<String>) -> Option<&'a str> {
    value.as_deref().filter(|v| !v.is_empty())
}

async fn list_namespaces(State(state): State<GatewayState>) -> Result<Json<NamespacesResponse>> {
    let _timer = RequestTimer::new("namespaces");

    let namespaces = discovery::discover(&state.client, Dimension::Namespace, &[]).await?;
    Ok(Json(NamespacesResponse {
        namespaces: namespaces.into_iter().collect(),
    }))
}

async fn list_deployments(
    State(state): State<GatewayState>,
    Query(params): Query<DeploymentsParams>,
) -> Result<Json<DeploymentsResponse>> {
    let _timer = RequestTimer::new("deployments");

    let namespace = required(&params.namespace)
        .ok_or_else(|| GatewayError::validation("Namespace parameter is required"))?;

    let deployments = discovery::discover(
        &state.client,
        Dimension::Deployment,
        &[("namespace", namespace)],
    )
    .await?;
    Ok(Json(DeploymentsResponse {
        deployments: deployments.into_iter().collect(),
    }))
}

async fn list_containers(
    State(state): State<GatewayState>,
    Query(params): Query<ContainersParams>,
) -> Result<Json<ContainersResponse>> {
    let _timer = RequestTimer::new("containers");

    let (namespace, deployment) = required(&params.namespace)
        .zip(required(&params.deployment))
        .ok_or_else(|| {
            GatewayError::validation("Namespace and deployment parameters are required")
        })?;

    let containers = discovery::discover(
        &state.client,
        Dimension::Container,
        &[("namespace", namespace), ("deployment", deployment)],
    )
    .await?;
    Ok(Json(ContainersResponse {
        containers: containers.into_iter().collect(),
    }))
}

async fn get_metrics(
    State(state): State<GatewayState>,
    Query(request): Query<MetricQueryRequest>,
) -> Result<Json<MetricsResponse>> {
    let _timer = RequestTimer::new("metrics");

    let query = query_builder::build(&request)?;
    info!(metric = %request.metric, namespace = %request.namespace, deployment = %request.deployment, "metric query");

    let series = state
        .client
        .query_range(&query, RangeWindow::dashboard())
        .await?
        .into_series()?;

    Ok(Json(MetricsResponse {
        query,
        datasets: normalize(&series),
    }))
}

async fn custom_query(
    State(state): State<GatewayState>,
    payload: std::result::Result<Json<CustomQueryRequest>, JsonRejection>,
) -> Result<Json<BackendEnvelope>> {
    let _timer = RequestTimer::new("query");

    let Json(request) = payload.map_err(|rejection| GatewayError::Validation(rejection.body_text()))?;
    let envelope = passthrough::execute(&state.client, &request).await?;
    Ok(Json(envelope))
}

async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        prometheus: state.config.prometheus_url.clone(),
    })
}

async fn gateway_metrics() -> Result<impl IntoResponse> {
    let body = metrics::render()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

pub async fn start_gateway(config: GatewayConfig) -> Result<()> {
    let addr = config.listen_addr();
    info!("Backend API server running on {}", addr);
    info!("Prometheus URL: {}", config.prometheus_url);
    info!("Available endpoints:");
    info!("  GET  /api/namespaces");
    info!("  GET  /api/deployments?namespace=<name>");
    info!("  GET  /api/containers?namespace=<name>&deployment=<name>");
    info!("  GET  /api/metrics?namespace=<name>&deployment=<name>&metric=<type>&containers=<list>");
    info!("  POST /api/query");
    info!("  GET  /health");

    let app = gateway_router(GatewayState::new(config));

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| GatewayError::Internal(format!("Failed to bind to address: {}", e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| GatewayError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
