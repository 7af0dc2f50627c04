//! Tests for health check and metrics endpoints.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::Value;

/// Test /health endpoint returns proper structure
#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    for field in ["status", "databaseConnected", "notifierHealthy", "waitingBacklog"] {
        assert!(body.get(field).is_some(), "Response should have '{field}' field");
    }
    assert_eq!(body["databaseConnected"], true);
    assert_eq!(body["notifierHealthy"], true);
    assert_eq!(
        body["status"], "healthy",
        "A fresh service with a working database reports healthy"
    );
}

/// Test /health/live endpoint
#[tokio::test]
async fn test_liveness_endpoint() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    server.get("/health/live").await.assert_status(StatusCode::OK);
}

/// Test /health/ready endpoint
#[tokio::test]
async fn test_readiness_endpoint() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    server.get("/health/ready").await.assert_status(StatusCode::OK);
}

/// Health endpoints stay open when an admin token is configured
#[tokio::test]
async fn test_health_needs_no_token() {
    let ctx = TestContext::with_admin_token().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    server.get("/health").await.assert_status_ok();
    server.get("/metrics").await.assert_status_ok();
}

/// Test /metrics reflects activity
#[tokio::test]
async fn test_metrics_count_sessions() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let before: Value = server.get("/metrics").await.json();
    server
        .post("/support/sessions")
        .json(&fixtures::new_session("Counted"))
        .await
        .assert_status(StatusCode::CREATED);
    let after: Value = server.get("/metrics").await.json();

    // Metrics are process-wide and other tests run concurrently
    assert!(
        after["sessions_created"].as_u64().unwrap() > before["sessions_created"].as_u64().unwrap()
    );
    assert!(after.get("request_latency_mean_ms").is_some());
}
