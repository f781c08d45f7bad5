//! Integration tests for sending messages to online and offline receivers.

use axum::http::StatusCode;
use serde_json::json;

use chathub_core::types::id::UserId;
use chathub_entity::message::Message;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_online_receiver_gets_pushed_message() {
    let app = TestApp::new();
    let (a, b) = (UserId::new(), UserId::new());
    let mut client = app.connect(b).await;

    let sent = app.send_text(a, b, "hello").await;

    assert_eq!(client.next_message().await, sent);
    assert!(client.is_idle());
    assert_eq!(app.state.realtime.metrics.snapshot().messages_pushed, 1);
}

#[tokio::test]
async fn test_offline_receiver_keeps_unseen_count() {
    let app = TestApp::new();
    let (a, b) = (UserId::new(), UserId::new());

    let sent = app.send_text(a, b, "you there?").await;

    assert!(!sent.seen);
    assert_eq!(app.state.store.count_unseen(a, b).await.expect("count"), 1);
    assert_eq!(app.state.realtime.metrics.snapshot().messages_pushed, 0);

    // The receiver comes online later and catches up from history.
    let mut client = app.connect(b).await;
    assert!(client.is_idle());
    let response = app
        .request("GET", &format!("/api/messages/{a}"), None, Some(b))
        .await;
    let history: Vec<Message> =
        serde_json::from_value(response.body["data"]["messages"].clone()).expect("messages");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, sent.id);
    assert_eq!(app.state.store.count_unseen(a, b).await.expect("count"), 0);
}

#[tokio::test]
async fn test_media_only_message() {
    let app = TestApp::new();
    let (a, b) = (UserId::new(), UserId::new());
    let mut client = app.connect(b).await;

    let response = app
        .request(
            "POST",
            &format!("/api/messages/send/{b}"),
            Some(json!({ "image": "uploads/cat.png" })),
            Some(a),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["mediaRef"], "uploads/cat.png");
    let pushed = client.next_message().await;
    assert!(pushed.text.is_none());
}

#[tokio::test]
async fn test_sender_is_not_pushed_own_message() {
    let app = TestApp::new();
    let (a, b) = (UserId::new(), UserId::new());
    let mut sender = app.connect(a).await;
    let mut receiver = app.connect(b).await;
    // a sees b come online
    sender.next_online().await;

    let sent = app.send_text(a, b, "ping").await;

    assert_eq!(receiver.next_message().await.id, sent.id);
    assert!(sender.is_idle());
}

#[tokio::test]
async fn test_push_to_closed_transport_reaps_receiver() {
    let app = TestApp::new();
    let (a, b) = (UserId::new(), UserId::new());
    let client = app.connect(b).await;
    drop(client.rx);

    let sent = app.send_text(a, b, "lost push").await;

    assert!(!sent.seen);
    app.wait_until(|state| !state.realtime.registry.is_online(b))
        .await;
    assert_eq!(app.state.store.count_unseen(a, b).await.expect("count"), 1);
}
