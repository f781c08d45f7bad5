//! Route definitions for the ChatHub HTTP API.
//!
//! REST routes are mounted under `/api`; the WebSocket upgrade lives at
//! `/ws`. The router receives `AppState` and passes it to all handlers via
//! Axum's `State` extractor.

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(message_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_upgrade))
        .with_state(state)
}

/// Conversations, sidebar, sending, and seen updates
fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages/users", get(handlers::messages::sidebar))
        .route(
            "/messages/{other_user_id}",
            get(handlers::messages::conversation),
        )
        .route("/messages/send/{id}", post(handlers::messages::send))
        .route("/messages/mark/{id}", put(handlers::messages::mark_seen))
}

/// Health check endpoints (no identity required)
fn health_routes() -> Router<AppState> {
    Router::new().route("/status", get(handlers::health::status))
}
