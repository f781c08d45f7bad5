//! Integration tests for the presence lifecycle.

use std::time::Duration;

use chathub_core::types::id::UserId;
use chathub_realtime::ConnectionEvent;

use crate::helpers::TestApp;

fn sorted(mut ids: Vec<UserId>) -> Vec<UserId> {
    ids.sort();
    ids
}

#[tokio::test]
async fn test_every_connection_sees_full_online_set() {
    let app = TestApp::new();
    let (u, v) = (UserId::new(), UserId::new());

    let mut cu = app.connect(u).await;
    let mut cv = app.connect(v).await;

    assert_eq!(cu.next_online().await, sorted(vec![u, v]));
    assert!(cv.is_idle());
    assert_eq!(app.state.realtime.registry.snapshot(), sorted(vec![u, v]));
}

#[tokio::test]
async fn test_disconnect_broadcasts_to_remaining() {
    let app = TestApp::new();
    let (u, v) = (UserId::new(), UserId::new());
    let mut cu = app.connect(u).await;
    let cv = app.connect(v).await;
    cu.next_online().await;

    app.state.realtime.connections.close(&cv.handle).await;

    assert_eq!(cu.next_online().await, vec![u]);
    assert!(!app.state.realtime.registry.is_online(v));
}

#[tokio::test]
async fn test_reconnect_supersedes_and_stale_close_is_ignored() {
    let app = TestApp::new();
    let (u, sender) = (UserId::new(), UserId::new());

    let first = app.connect(u).await;
    let mut second = app.connect(u).await;
    assert_eq!(app.state.realtime.registry.len(), 1);
    assert_eq!(
        app.state
            .realtime
            .registry
            .lookup(u)
            .map(|h| h.id),
        Some(second.handle.id)
    );

    // The old transport closes after the new one registered.
    app.state.realtime.connections.close(&first.handle).await;
    app.wait_until(|state| state.realtime.metrics.snapshot().stale_disconnects == 1)
        .await;

    assert!(app.state.realtime.registry.is_online(u));
    assert!(second.is_idle());

    let sent = app.send_text(sender, u, "still here").await;
    assert_eq!(second.next_message().await, sent);

    let metrics = app.state.realtime.metrics.snapshot();
    assert_eq!(metrics.connections_superseded, 1);
    assert_eq!(metrics.connections_closed, 0);
}

#[tokio::test]
async fn test_status_lists_online_users() {
    let app = TestApp::new();
    let u = UserId::new();
    let _client = app.connect(u).await;

    let response = app.request("GET", "/api/status", None, None).await;

    assert_eq!(response.body["data"]["onlineUsers"], 1);
}

#[tokio::test]
async fn test_sidebar_reports_online_users() {
    let app = TestApp::new();
    let (u, viewer) = (UserId::new(), UserId::new());
    let _client = app.connect(u).await;

    let response = app
        .request("GET", "/api/messages/users", None, Some(viewer))
        .await;

    assert_eq!(
        response.body["data"]["onlineUsers"],
        serde_json::json!([u.to_string()])
    );
}

#[tokio::test]
async fn test_lost_connection_is_closed_for_its_client() {
    let app = TestApp::new();
    let (u, v) = (UserId::new(), UserId::new());
    let mut cu = app.connect(u).await;
    let mut cv = app.connect(v).await;
    cu.next_online().await;

    app.state
        .realtime
        .events()
        .send(ConnectionEvent::liveness_lost(&cv.handle))
        .await
        .expect("event loop running");

    assert_eq!(cu.next_online().await, vec![u]);
    // The client's writer ends, so its transport closes and it can reconnect.
    tokio::time::timeout(Duration::from_secs(1), async {
        while cv.rx.recv().await.is_some() {}
    })
    .await
    .expect("writer closed");

    let mut again = app.connect(v).await;
    assert!(app.state.realtime.registry.is_online(v));
    let sent = app.send_text(u, v, "welcome back").await;
    assert_eq!(again.next_message().await, sent);
}
