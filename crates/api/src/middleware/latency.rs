//! Request latency tracking.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use telemetry::metrics;

/// Records every request's wall time in the request latency histogram.
pub async fn record_latency(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    metrics()
        .request_latency_ms
        .observe(start.elapsed().as_millis() as u64);
    response
}
