//! Health check and metrics endpoints.

use axum::{http::StatusCode, Json};
use telemetry::{health, metrics, MetricsSnapshot};

use crate::response::HealthResponse;

/// GET /health - Full health check.
pub async fn health_handler() -> Json<HealthResponse> {
    let report = health().report();

    Json(HealthResponse {
        status: format!("{:?}", report.status).to_lowercase(),
        database_connected: health().database.is_healthy(),
        notifier_healthy: health().notifier.is_healthy(),
        waiting_backlog: metrics().waiting_backlog.get(),
    })
}

/// GET /health/ready - Readiness probe (can accept traffic).
pub async fn ready_handler() -> StatusCode {
    if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /metrics - Point-in-time counters.
pub async fn metrics_handler() -> Json<MetricsSnapshot> {
    Json(metrics().snapshot())
}
