//! End-to-end tests for sessions, the message log and assignment.
//!
//! Every request goes through the real router, coordinator and an in-memory
//! SQLite store.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use axum_test::TestServer;
use integration_tests::{
    fixtures::{self, ADA, GRACE},
    setup::TestContext,
};
use serde_json::{json, Value};

async fn open_session(server: &TestServer, subject: &str) -> Value {
    let response = server
        .post("/support/sessions")
        .json(&fixtures::new_session(subject))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .expect("RFC 3339 timestamp")
        .with_timezone(&Utc)
}

fn contents(detail: &Value) -> Vec<String> {
    detail["messages"]
        .as_array()
        .expect("messages array")
        .iter()
        .map(|m| m["content"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_session_greets_and_assigns() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server, "Billing question").await;

    assert!(session["sessionId"].as_str().unwrap().starts_with("sess_"));
    assert_eq!(session["status"], "ACTIVE");
    assert_eq!(session["assignedTo"], ADA);
    assert!(session["assignedAt"].is_string());
    assert_eq!(session["priority"], "HIGH");
    assert_eq!(session["metadata"]["page"], "/pricing");
    assert_eq!(
        contents(&session),
        vec![
            "Hello! How can we help you today?".to_string(),
            "Session assigned to Ada Lovelace".to_string(),
        ]
    );
    assert!(session["messages"]
        .as_array()
        .unwrap()
        .iter()
        .all(|m| m["senderType"] == "SYSTEM"));
}

#[tokio::test]
async fn test_auto_assignment_prefers_least_loaded_agent() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let first = open_session(&server, "one").await;
    let second = open_session(&server, "two").await;
    assert_eq!(first["assignedTo"], ADA);
    assert_eq!(second["assignedTo"], GRACE);

    open_session(&server, "three").await;
    open_session(&server, "four").await;

    let agents: Value = server.get("/support/agents").await.json();
    let loads: Vec<(String, u64)> = agents
        .as_array()
        .unwrap()
        .iter()
        .map(|a| (a["id"].as_str().unwrap().to_string(), a["load"].as_u64().unwrap()))
        .collect();
    assert_eq!(
        loads,
        vec![(ADA.to_string(), 2), (GRACE.to_string(), 2)],
        "only assignable agents are listed and load stays balanced"
    );
}

#[tokio::test]
async fn test_full_capacity_leaves_session_waiting_until_assigned() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    server
        .put("/support/config")
        .json(&json!({ "maxSessionsPerAgent": 1 }))
        .await
        .assert_status_ok();

    let first = open_session(&server, "one").await;
    open_session(&server, "two").await;
    let third = open_session(&server, "three").await;

    assert_eq!(third["status"], "WAITING");
    assert!(third["assignedTo"].is_null());
    assert_eq!(contents(&third).len(), 1, "only the welcome message");

    // Nobody has capacity: manual assignment returns the session unchanged
    let unchanged: Value = server
        .post(&format!("/support/sessions/{}/assign", third["id"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(unchanged["status"], "WAITING");
    assert_eq!(unchanged["version"], third["version"]);

    server
        .put(&format!("/support/sessions/{}", first["id"].as_str().unwrap()))
        .json(&json!({ "status": "CLOSED" }))
        .await
        .assert_status_ok();

    let assigned: Value = server
        .post(&format!("/support/sessions/{}/assign", third["id"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(assigned["status"], "ACTIVE");
    assert_eq!(assigned["assignedTo"], first["assignedTo"]);
    assert_eq!(
        contents(&assigned).last().unwrap(),
        &format!("Session assigned to {}", "Ada Lovelace")
    );
}

#[tokio::test]
async fn test_message_log_is_ordered_and_touches_session() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server, "Order status").await;
    let id = session["sessionId"].as_str().unwrap();
    let path = format!("/support/sessions/{id}/messages");

    let visitor = server
        .post(&path)
        .json(&fixtures::message("Where is my order?", "USER", None))
        .await;
    visitor.assert_status(StatusCode::CREATED);
    let visitor: Value = visitor.json();
    assert_eq!(visitor["status"], "SENT");
    assert_eq!(visitor["messageType"], "TEXT");

    server
        .post(&path)
        .json(&fixtures::message("Let me check.", "AGENT", Some(ADA)))
        .await
        .assert_status(StatusCode::CREATED);

    let log: Vec<Value> = server.get(&path).await.json();
    let texts: Vec<&str> = log.iter().map(|m| m["content"].as_str().unwrap()).collect();
    assert_eq!(
        texts,
        vec![
            "Hello! How can we help you today?",
            "Session assigned to Ada Lovelace",
            "Where is my order?",
            "Let me check.",
        ]
    );

    let detail: Value = server.get(&format!("/support/sessions/{id}")).await.json();
    assert!(
        timestamp(&detail["lastActivityAt"]) >= timestamp(&visitor["createdAt"]),
        "appending refreshes lastActivityAt"
    );
}

#[tokio::test]
async fn test_closed_session_rejects_messages_but_accepts_rating() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server, "Refund").await;
    let id = session["id"].as_str().unwrap();

    let closed: Value = server
        .put(&format!("/support/sessions/{id}"))
        .json(&json!({ "status": "CLOSED", "rating": 5, "feedback": "Great help" }))
        .await
        .json();
    assert_eq!(closed["status"], "CLOSED");
    assert!(closed["endedAt"].is_string());
    assert_eq!(closed["rating"], 5);
    assert_eq!(contents(&closed).last().unwrap(), "Session has been closed");

    let response = server
        .post(&format!("/support/sessions/{id}/messages"))
        .json(&fixtures::message("hello?", "USER", None))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONFLICT_004");

    let detail: Value = server.get(&format!("/support/sessions/{id}")).await.json();
    assert_eq!(contents(&detail).len(), contents(&closed).len());
}

#[tokio::test]
async fn test_rating_open_session_is_rejected() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server, "Rating").await;
    let response = server
        .put(&format!("/support/sessions/{}", session["id"].as_str().unwrap()))
        .json(&json!({ "rating": 4 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_004");
}

#[tokio::test]
async fn test_admin_view_and_read_receipts() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server, "Preview").await;
    let id = session["id"].as_str().unwrap();
    for text in ["hi", "anyone there?"] {
        server
            .post(&format!("/support/sessions/{id}/messages"))
            .json(&fixtures::message(text, "USER", None))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let page: Value = server
        .get("/support/sessions")
        .add_query_param("adminView", "true")
        .await
        .json();
    let row = &page["sessions"][0];
    assert_eq!(row["unreadCount"], 2);
    assert_eq!(row["lastMessage"]["content"], "anyone there?");

    let receipt: Value = server
        .put(&format!("/support/sessions/{id}/messages/read"))
        .json(&json!({ "senderType": "USER" }))
        .await
        .json();
    assert_eq!(receipt["updated"], 2);

    let page: Value = server
        .get("/support/sessions")
        .add_query_param("adminView", "true")
        .await
        .json();
    assert_eq!(page["sessions"][0]["unreadCount"], 0);

    let plain: Value = server.get("/support/sessions").await.json();
    assert!(plain["sessions"][0].get("unreadCount").is_none());
}

#[tokio::test]
async fn test_listing_filters_and_paginates() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let oldest = open_session(&server, "a").await;
    open_session(&server, "b").await;
    let newest = open_session(&server, "c").await;

    let page: Value = server
        .get("/support/sessions")
        .add_query_param("limit", "2")
        .await
        .json();
    assert_eq!(page["pagination"]["total"], 3);
    assert_eq!(page["pagination"]["totalPages"], 2);
    assert_eq!(page["sessions"].as_array().unwrap().len(), 2);
    assert_eq!(page["sessions"][0]["id"], newest["id"], "newest first");

    let second: Value = server
        .get("/support/sessions")
        .add_query_param("limit", "2")
        .add_query_param("page", "2")
        .await
        .json();
    assert_eq!(second["sessions"][0]["id"], oldest["id"]);

    let by_agent: Value = server
        .get("/support/sessions")
        .add_query_param("assignedTo", GRACE)
        .await
        .json();
    assert_eq!(by_agent["pagination"]["total"], 1);

    let waiting: Value = server
        .get("/support/sessions")
        .add_query_param("status", "WAITING")
        .await
        .json();
    assert_eq!(waiting["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_delete_closes_session() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server, "Delete me").await;
    let public_id = session["sessionId"].as_str().unwrap();

    let deleted: Value = server
        .delete(&format!("/support/sessions/{public_id}"))
        .await
        .json();
    assert_eq!(deleted["status"], "CLOSED");
    assert!(deleted["endedAt"].is_string());

    // The row survives the soft delete
    let detail = server.get(&format!("/support/sessions/{public_id}")).await;
    detail.assert_status_ok();
    let detail: Value = detail.json();
    assert_eq!(detail["id"], session["id"]);
}

#[tokio::test]
async fn test_disabled_support_uses_offline_greeting() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let config: Value = server
        .put("/support/config")
        .json(&json!({ "enabled": false }))
        .await
        .json();
    assert_eq!(config["enabled"], false);

    let session = open_session(&server, "After hours").await;
    assert_eq!(session["status"], "WAITING");
    assert!(session["assignedTo"].is_null());
    assert_eq!(contents(&session), vec![config["offlineMessage"].as_str().unwrap().to_string()]);
}
