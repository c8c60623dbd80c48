use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse, routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{config::ExporterConfig, synthetic::SyntheticCluster, GatewayError, Result};

pub fn exporter_router(cluster: Arc<SyntheticCluster>) -> Router {
    Router::new()
        .route("/metrics", get(scrape))
        .route("/health", get(health))
        .with_state(cluster)
        .layer(TraceLayer::new_for_http())
}

async fn scrape(State(cluster): State<Arc<SyntheticCluster>>) -> Result<impl IntoResponse> {
    let body = cluster.scrape()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn start_exporter(config: ExporterConfig) -> Result<()> {
    let cluster = Arc::new(SyntheticCluster::new(config.seed)?);
    let addr = config.listen_addr();
    info!("Synthetic metrics exporter running on {}", addr);
    info!("Serving {} scrape targets at http://{}/metrics", cluster.targets().len(), addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| GatewayError::Internal(format!("Failed to bind to address: {}", e)))?;

    axum::serve(listener, exporter_router(cluster))
        .await
        .map_err(|e| GatewayError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
