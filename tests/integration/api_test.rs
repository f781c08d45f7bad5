//! Integration tests for the REST endpoints.

use axum::http::StatusCode;
use serde_json::json;

use chathub_core::types::id::{MessageId, UserId};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_status_reports_ok() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/status", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["storeHealthy"], true);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/messages/users", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "AUTHENTICATION");
}

#[tokio::test]
async fn test_send_requires_content() {
    let app = TestApp::new();
    let (a, b) = (UserId::new(), UserId::new());

    let response = app
        .request(
            "POST",
            &format!("/api/messages/send/{b}"),
            Some(json!({ "text": "   " })),
            Some(a),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "INVALID_CONTENT");

    let response = app
        .request("GET", &format!("/api/messages/{a}"), None, Some(b))
        .await;
    assert_eq!(response.body["data"]["messages"], json!([]));
}

#[tokio::test]
async fn test_send_rejects_oversized_text() {
    let app = TestApp::new();
    let (a, b) = (UserId::new(), UserId::new());

    let response = app
        .request(
            "POST",
            &format!("/api/messages/send/{b}"),
            Some(json!({ "text": "x".repeat(10_001) })),
            Some(a),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION");
}

#[tokio::test]
async fn test_invalid_path_id() {
    let app = TestApp::new();

    let response = app
        .request("GET", "/api/messages/not-a-uuid", None, Some(UserId::new()))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mark_unknown_message() {
    let app = TestApp::new();

    let response = app
        .request(
            "PUT",
            &format!("/api/messages/mark/{}", MessageId::new()),
            None,
            Some(UserId::new()),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_mark_seen_twice() {
    let app = TestApp::new();
    let (a, b) = (UserId::new(), UserId::new());
    let message = app.send_text(a, b, "hello").await;

    for _ in 0..2 {
        let response = app
            .request(
                "PUT",
                &format!("/api/messages/mark/{}", message.id),
                None,
                Some(b),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["data"]["seen"], true);
    }

    let stored = app
        .state
        .store
        .find_by_id(message.id)
        .await
        .expect("find")
        .expect("exists");
    assert!(stored.seen);
}

#[tokio::test]
async fn test_sidebar_counts_and_read_clears() {
    let app = TestApp::new();
    let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());

    app.send_text(a, b, "one").await;
    app.send_text(a, b, "two").await;
    app.send_text(c, b, "three").await;

    let response = app
        .request("GET", "/api/messages/users", None, Some(b))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let unseen = &response.body["data"]["unseenMessages"];
    assert_eq!(unseen[a.to_string()], 2);
    assert_eq!(unseen[c.to_string()], 1);
    assert_eq!(response.body["data"]["users"].as_array().map(Vec::len), Some(2));

    let response = app
        .request("GET", &format!("/api/messages/{a}"), None, Some(b))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["markedSeen"], 2);
    let messages = response.body["data"]["messages"]
        .as_array()
        .expect("messages");
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m["seen"] == true));

    let response = app
        .request("GET", "/api/messages/users", None, Some(b))
        .await;
    let unseen = response.body["data"]["unseenMessages"]
        .as_object()
        .expect("map");
    assert_eq!(unseen.len(), 1);
    assert_eq!(unseen[&c.to_string()], 1);
}

#[tokio::test]
async fn test_sidebar_explicit_ids() {
    let app = TestApp::new();
    let (a, b, stranger) = (UserId::new(), UserId::new(), UserId::new());
    app.send_text(a, b, "hi").await;

    let response = app
        .request(
            "GET",
            &format!("/api/messages/users?ids={a},{stranger},{b}"),
            None,
            Some(b),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["data"]["users"],
        json!([a.to_string(), stranger.to_string()])
    );
    let unseen = response.body["data"]["unseenMessages"]
        .as_object()
        .expect("map");
    assert_eq!(unseen.len(), 1);
}

#[tokio::test]
async fn test_conversation_is_ordered_both_directions() {
    let app = TestApp::new();
    let (a, b) = (UserId::new(), UserId::new());

    let m1 = app.send_text(a, b, "first").await;
    let m2 = app.send_text(b, a, "second").await;
    let m3 = app.send_text(a, b, "third").await;

    let response = app
        .request("GET", &format!("/api/messages/{b}"), None, Some(a))
        .await;
    let ids: Vec<String> = response.body["data"]["messages"]
        .as_array()
        .expect("messages")
        .iter()
        .map(|m| m["id"].as_str().expect("id").to_string())
        .collect();

    assert_eq!(
        ids,
        vec![m1.id.to_string(), m2.id.to_string(), m3.id.to_string()]
    );
    // a read the conversation, so only b's message to a was marked
    assert_eq!(response.body["data"]["markedSeen"], 1);
}

#[tokio::test]
async fn test_send_returns_created_with_trimmed_text() {
    let app = TestApp::new();
    let (a, b) = (UserId::new(), UserId::new());

    let response = app
        .request(
            "POST",
            &format!("/api/messages/send/{b}"),
            Some(json!({ "text": "  hi  " })),
            Some(a),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["text"], "hi");
    assert_eq!(response.body["data"]["seen"], false);
}
