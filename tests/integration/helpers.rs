//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use chathub_api::AppState;
use chathub_core::config::AppConfig;
use chathub_core::types::id::UserId;
use chathub_database::{MemoryMessageStore, MessageStore};
use chathub_entity::message::Message;
use chathub_realtime::{ConnectionHandle, OutboundMessage, RealtimeEngine};

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for reaching the store and engine directly
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application over an empty in-memory store
    pub fn new() -> Self {
        let config = AppConfig::default();
        let store: Arc<dyn MessageStore> = Arc::new(MemoryMessageStore::new());
        let realtime = RealtimeEngine::start(config.realtime.clone());
        let state = AppState::new(config, store, realtime);
        let router = chathub_api::build_app(state.clone());
        Self { router, state }
    }

    /// Make an HTTP request as `user`
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        user: Option<UserId>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(user) = user {
            req = req.header("x-user-id", user.to_string());
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Send a text message over HTTP and return the stored message
    pub async fn send_text(&self, from: UserId, to: UserId, text: &str) -> Message {
        let response = self
            .request(
                "POST",
                &format!("/api/messages/send/{to}"),
                Some(serde_json::json!({ "text": text })),
                Some(from),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "send failed: {}", response.body);
        serde_json::from_value(response.body["data"].clone()).expect("message body")
    }

    /// Open a live connection for `user` and wait until it is registered
    pub async fn connect(&self, user: UserId) -> TestClient {
        let (handle, rx) = self
            .state
            .realtime
            .connections
            .open(user)
            .await
            .expect("open connection");
        let mut client = TestClient { handle, rx };
        let online = client.next_online().await;
        assert!(online.contains(&user));
        client
    }

    /// Poll until `cond` holds, failing after one second
    pub async fn wait_until(&self, mut cond: impl FnMut(&AppState) -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        while !cond(&self.state) {
            assert!(
                tokio::time::Instant::now() < deadline,
                "condition not reached in time"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

/// One live connection as seen by its client
pub struct TestClient {
    /// The server-side handle
    pub handle: Arc<ConnectionHandle>,
    /// Frames pushed to this connection
    pub rx: mpsc::Receiver<OutboundMessage>,
}

impl TestClient {
    /// Next frame other than keepalives
    pub async fn next_frame(&mut self) -> OutboundMessage {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(1), self.rx.recv())
                .await
                .expect("timed out waiting for frame")
                .expect("connection closed");
            if !matches!(frame, OutboundMessage::Ping { .. }) {
                return frame;
            }
        }
    }

    /// Next online set pushed to this connection
    pub async fn next_online(&mut self) -> Vec<UserId> {
        match self.next_frame().await {
            OutboundMessage::OnlineUsers { user_ids } => user_ids,
            other => panic!("expected online_users, got {other:?}"),
        }
    }

    /// Next pushed message
    pub async fn next_message(&mut self) -> Message {
        match self.next_frame().await {
            OutboundMessage::NewMessage { message } => message,
            other => panic!("expected new_message, got {other:?}"),
        }
    }

    /// Whether nothing is waiting in the queue
    pub fn is_idle(&mut self) -> bool {
        loop {
            match self.rx.try_recv() {
                Ok(OutboundMessage::Ping { .. }) => continue,
                Ok(_) => return false,
                Err(_) => return true,
            }
        }
    }
}

/// Test response wrapper
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
