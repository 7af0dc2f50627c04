//! End-to-end tests for the transfer workflow.

use axum::http::StatusCode;
use axum_test::TestServer;
use coordinator::Notification;
use integration_tests::{
    fixtures::{self, ADA, GRACE, KEN, LINUS},
    setup::TestContext,
};
use serde_json::{json, Value};

/// Opens a session (auto-assigned to Ada) and returns it.
async fn open_session(server: &TestServer) -> Value {
    let response = server
        .post("/support/sessions")
        .json(&fixtures::new_session("Transfer me"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let session: Value = response.json();
    assert_eq!(session["assignedTo"], ADA);
    session
}

async fn request_transfer(server: &TestServer, session: &Value) -> Value {
    let response = server
        .post("/support/transfers")
        .json(&fixtures::transfer(
            session["sessionId"].as_str().unwrap(),
            Some(ADA),
            GRACE,
        ))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

async fn session_detail(server: &TestServer, session: &Value) -> Value {
    server
        .get(&format!("/support/sessions/{}", session["id"].as_str().unwrap()))
        .await
        .json()
}

fn last_message(detail: &Value) -> String {
    detail["messages"]
        .as_array()
        .and_then(|m| m.last())
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_transfer_request_logs_and_notifies() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server).await;
    let transfer = request_transfer(&server, &session).await;

    assert_eq!(transfer["status"], "PENDING");
    assert_eq!(transfer["sessionId"], session["id"]);
    assert_eq!(transfer["toAgentId"], GRACE);

    let detail = session_detail(&server, &session).await;
    assert_eq!(
        last_message(&detail),
        "Transfer requested from Ada Lovelace to Grace Hopper. Reason: Needs billing expertise"
    );
    assert_eq!(detail["status"], "ACTIVE", "requesting a transfer keeps the session status");
    assert_eq!(detail["transfers"].as_array().unwrap().len(), 1);

    let sent = ctx.notifier.wait_for(1).await;
    assert_eq!(
        sent,
        vec![Notification::TransferRequested {
            transfer_id: transfer["id"].as_str().unwrap().to_string(),
            session_id: session["sessionId"].as_str().unwrap().to_string(),
            from_agent_id: Some(ADA.to_string()),
            to_agent_id: GRACE.to_string(),
            reason: Some("Needs billing expertise".to_string()),
        }]
    );
}

#[tokio::test]
async fn test_second_pending_transfer_is_rejected() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server).await;
    request_transfer(&server, &session).await;

    let response = server
        .post("/support/transfers")
        .json(&fixtures::transfer(session["id"].as_str().unwrap(), None, GRACE))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONFLICT_001");

    let transfers: Vec<Value> = server
        .get("/support/transfers")
        .add_query_param("sessionId", session["sessionId"].as_str().unwrap())
        .await
        .json();
    assert_eq!(transfers.len(), 1);
}

#[tokio::test]
async fn test_accept_reassigns_session_once() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server).await;
    let transfer = request_transfer(&server, &session).await;
    let path = format!("/support/transfers/{}", transfer["id"].as_str().unwrap());

    let accepted: Value = server
        .put(&path)
        .json(&json!({ "status": "ACCEPTED" }))
        .await
        .json();
    assert_eq!(accepted["status"], "ACCEPTED");
    assert!(accepted["acceptedAt"].is_string());

    let detail = session_detail(&server, &session).await;
    assert_eq!(detail["assignedTo"], GRACE);
    assert_eq!(detail["status"], "ACTIVE");
    assert_eq!(last_message(&detail), "Session transferred to Grace Hopper");

    // Terminal transfers never move again
    let response = server
        .put(&path)
        .json(&json!({ "status": "REJECTED" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONFLICT_002");

    let fetched: Value = server.get(&path).await.json();
    assert_eq!(fetched["status"], "ACCEPTED");
}

#[tokio::test]
async fn test_reject_keeps_assignment_and_records_notes() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server).await;
    let transfer = request_transfer(&server, &session).await;

    let rejected: Value = server
        .put(&format!("/support/transfers/{}", transfer["id"].as_str().unwrap()))
        .json(&json!({ "status": "REJECTED", "notes": "At capacity" }))
        .await
        .json();
    assert_eq!(rejected["status"], "REJECTED");
    assert_eq!(rejected["notes"], "At capacity");

    let detail = session_detail(&server, &session).await;
    assert_eq!(detail["assignedTo"], ADA);
    assert_eq!(
        last_message(&detail),
        "Grace Hopper rejected the transfer. Notes: At capacity"
    );

    // The session is free for a new request
    request_transfer(&server, &session).await;
}

#[tokio::test]
async fn test_transfer_target_must_be_assignable() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server).await;
    for target in [LINUS, KEN, "agent-nobody", ADA] {
        let response = server
            .post("/support/transfers")
            .json(&fixtures::transfer(
                session["id"].as_str().unwrap(),
                Some(ADA),
                target,
            ))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALID_003", "target {target}");
        assert_eq!(body["details"][0]["field"], "toAgentId");
    }

    let transfers: Vec<Value> = server.get("/support/transfers").await.json();
    assert!(transfers.is_empty());
}

#[tokio::test]
async fn test_closing_session_cancels_pending_transfer() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server).await;
    let transfer = request_transfer(&server, &session).await;

    server
        .delete(&format!("/support/sessions/{}", session["id"].as_str().unwrap()))
        .await
        .assert_status_ok();

    let fetched: Value = server
        .get(&format!("/support/transfers/{}", transfer["id"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(fetched["status"], "CANCELLED");
    assert!(fetched["cancelledAt"].is_string());

    let pending: Vec<Value> = server
        .get("/support/transfers")
        .add_query_param("status", "PENDING")
        .await
        .json();
    assert!(pending.is_empty());

    // A terminal session takes no new transfers
    let response = server
        .post("/support/transfers")
        .json(&fixtures::transfer(session["id"].as_str().unwrap(), None, GRACE))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONFLICT_004");
}

#[tokio::test]
async fn test_cancel_by_requester() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let session = open_session(&server).await;
    let transfer = request_transfer(&server, &session).await;

    let cancelled: Value = server
        .put(&format!("/support/transfers/{}", transfer["id"].as_str().unwrap()))
        .json(&json!({ "status": "CANCELLED" }))
        .await
        .json();
    assert_eq!(cancelled["status"], "CANCELLED");

    let detail = session_detail(&server, &session).await;
    assert_eq!(last_message(&detail), "Transfer to Grace Hopper was cancelled");
    assert_eq!(detail["assignedTo"], ADA);
}
