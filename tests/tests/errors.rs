//! Tests for error responses: codes, status and body shape.

use api::middleware::rate_limit::RateLimitConfig;
use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::{
    fixtures,
    setup::{TestContext, TestOptions},
};
use serde_json::{json, Value};

async fn open_session(server: &TestServer) -> Value {
    let response = server
        .post("/support/sessions")
        .json(&fixtures::new_session("Errors"))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

/// Malformed JSON body returns VALID_001
#[tokio::test]
async fn test_malformed_json() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/support/sessions")
        .content_type("application/json")
        .bytes("{not valid json".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_001");
    assert!(body["error"].is_string());
}

/// Unknown enum value in the query string returns VALID_001
#[tokio::test]
async fn test_bad_query_param() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .get("/support/sessions")
        .add_query_param("status", "SLEEPING")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

/// Field validation returns VALID_002 with camelCase field details
#[tokio::test]
async fn test_field_validation_details() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/support/sessions")
        .json(&json!({ "visitorEmail": "not-an-email" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_002");
    assert_eq!(body["details"][0]["field"], "visitorEmail");

    let listing: Value = server.get("/support/sessions").await.json();
    assert_eq!(listing["pagination"]["total"], 0, "nothing was written");
}

/// Messages reserve the SYSTEM sender and reject empty content
#[tokio::test]
async fn test_message_validation() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server).await;
    let path = format!("/support/sessions/{}/messages", session["id"].as_str().unwrap());

    let response = server
        .post(&path)
        .json(&fixtures::message("spoofed", "SYSTEM", None))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_002");

    let response = server
        .post(&path)
        .json(&fixtures::message("", "USER", None))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_002");
    assert_eq!(body["details"][0]["field"], "content");

    let response = server
        .post(&path)
        .json(&fixtures::message("hi", "AGENT", Some("agent-nobody")))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_003");
}

/// Attachments must declare an allowed type and fit the size limit
#[tokio::test]
async fn test_attachment_type_and_size_limits() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server).await;
    let url = format!("/support/sessions/{}/messages", session["id"].as_str().unwrap());
    let attachment = |mime: Option<&str>, size: u64| {
        json!({
            "content": "https://files.example.com/upload",
            "senderType": "USER",
            "messageType": "IMAGE",
            "mimeType": mime,
            "sizeBytes": size,
        })
    };

    let response = server.post(&url).json(&attachment(Some("image/png"), 4096)).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["messageType"], "IMAGE");

    for (body, field) in [
        (attachment(Some("application/x-msdownload"), 4096), "mimeType"),
        (attachment(None, 4096), "mimeType"),
        (attachment(Some("image/png"), 11 * 1024 * 1024), "sizeBytes"),
    ] {
        let response = server.post(&url).json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALID_002");
        assert_eq!(body["details"][0]["field"], field);
    }
}

/// Uploads are refused once disabled
#[tokio::test]
async fn test_attachments_respect_config() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    server
        .put("/support/config")
        .json(&json!({ "allowFileUpload": false }))
        .await
        .assert_status_ok();

    let session = open_session(&server).await;
    let response = server
        .post(&format!("/support/sessions/{}/messages", session["id"].as_str().unwrap()))
        .json(&json!({
            "content": "https://files.example.com/receipt.pdf",
            "senderType": "USER",
            "messageType": "FILE",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_002");
    assert_eq!(body["details"][0]["field"], "messageType");
}

/// Unknown ids return the matching NOT_FOUND code
#[tokio::test]
async fn test_not_found_codes() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.get("/support/sessions/sess_missing").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND_001");
    assert!(body.get("details").is_none());

    let response = server
        .post("/support/sessions/sess_missing/messages")
        .json(&fixtures::message("hi", "USER", None))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server.get("/support/transfers/tr_missing").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND_002");
}

/// Illegal status moves return CONFLICT_002
#[tokio::test]
async fn test_illegal_transition() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server).await;
    let path = format!("/support/sessions/{}", session["id"].as_str().unwrap());
    server
        .put(&path)
        .json(&json!({ "status": "ABANDONED" }))
        .await
        .assert_status_ok();

    let response = server.put(&path).json(&json!({ "status": "ACTIVE" })).await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONFLICT_002");
}

/// A stale expectedVersion returns CONFLICT_003 and changes nothing
#[tokio::test]
async fn test_stale_version() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server).await;
    let path = format!("/support/sessions/{}", session["id"].as_str().unwrap());
    let version = session["version"].as_i64().unwrap();

    server
        .put(&path)
        .json(&json!({ "subject": "first writer", "expectedVersion": version }))
        .await
        .assert_status_ok();

    let response = server
        .put(&path)
        .json(&json!({ "subject": "second writer", "expectedVersion": version }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONFLICT_003");

    let detail: Value = server.get(&path).await.json();
    assert_eq!(detail["subject"], "first writer");
}

/// Agent routes require the admin token when one is configured
#[tokio::test]
async fn test_admin_token_required() {
    let ctx = TestContext::with_admin_token().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.get("/support/sessions").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "AUTH_001");

    let response = server
        .get("/support/config")
        .add_header("Authorization", "Bearer wrong-token")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    server
        .get("/support/sessions")
        .add_header("Authorization", &fixtures::bearer())
        .await
        .assert_status_ok();

    // Visitor routes stay open
    let session = open_session(&server).await;
    server
        .get(&format!("/support/sessions/{}", session["sessionId"].as_str().unwrap()))
        .await
        .assert_status_ok();
    server
        .post(&format!("/support/sessions/{}/messages", session["id"].as_str().unwrap()))
        .json(&fixtures::message("hello", "USER", None))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .delete(&format!("/support/sessions/{}", session["id"].as_str().unwrap()))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

/// Posting as an agent needs the admin token; visitors post freely
#[tokio::test]
async fn test_agent_messages_require_admin_token() {
    let ctx = TestContext::with_admin_token().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server).await;
    let id = session["id"].as_str().unwrap();
    let url = format!("/support/sessions/{id}/messages");
    let before = server.get(&url).await.json::<Vec<Value>>().len();

    let response = server
        .post(&url)
        .json(&fixtures::message("I can help", "AGENT", Some(fixtures::ADA)))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "AUTH_001");
    assert_eq!(
        server.get(&url).await.json::<Vec<Value>>().len(),
        before,
        "Rejected agent message must not be stored"
    );

    let response = server
        .post(&url)
        .add_header("Authorization", &fixtures::bearer())
        .json(&fixtures::message("I can help", "AGENT", Some(fixtures::ADA)))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["senderType"], "AGENT");
    assert_eq!(body["senderId"], fixtures::ADA);

    server
        .post(&url)
        .json(&fixtures::message("thanks", "USER", None))
        .await
        .assert_status(StatusCode::CREATED);
}

/// Session creation is rate limited per client
#[tokio::test]
async fn test_session_creation_rate_limited() {
    let ctx = TestContext::with_options(TestOptions {
        rate_limit: RateLimitConfig {
            rate: 0.01,
            burst: 2,
        },
        ..TestOptions::default()
    })
    .await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    for _ in 0..2 {
        server
            .post("/support/sessions")
            .add_header("X-Forwarded-For", "203.0.113.7")
            .json(&json!({}))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = server
        .post("/support/sessions")
        .add_header("X-Forwarded-For", "203.0.113.7")
        .json(&json!({}))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["code"], "RATE_001");
    let retry_after: u64 = response
        .header("Retry-After")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1);

    // Other clients keep their own bucket
    server
        .post("/support/sessions")
        .add_header("X-Forwarded-For", "198.51.100.1")
        .json(&json!({}))
        .await
        .assert_status(StatusCode::CREATED);
}
