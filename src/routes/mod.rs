use std::sync::Arc;

use axum::extract::State;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub mod health;
pub mod jobs;

/// Request bodies are small JSON documents.
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Build the HTTP router: job endpoints, health and Prometheus scrape.
///
/// Every response carries `Access-Control-Allow-Origin: *`.
pub fn router(state: AppState, prometheus: PrometheusHandle) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/start-job", post(jobs::start_job))
        .route("/job-status", get(jobs::missing_job_id))
        .route("/job-status/", get(jobs::missing_job_id))
        .route("/job-status/{job_id}", get(jobs::get_job_status))
        .with_state(state)
        .route(
            "/metrics",
            get(prometheus_metrics).with_state(Arc::new(prometheus)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}

/// GET /metrics — Prometheus text exposition.
async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> String {
    handle.render()
}
