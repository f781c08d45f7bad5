//! Application builder: wires router, middleware, and state into an Axum
//! app, and serves it.

use std::future::{Future, IntoFuture};
use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use chathub_core::error::AppError;
use chathub_core::result::AppResult;

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server);
    build_router(state)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Binds the configured address and serves `state` until `shutdown`
/// resolves, then stops the real-time engine.
///
/// In-flight requests get `shutdown_grace_seconds` to finish.
pub async fn serve<F>(state: AppState, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::configuration(format!("Failed to bind {addr}: {e}")))?;
    info!(addr = %addr, "HTTP server listening");

    let grace = Duration::from_secs(state.config.server.shutdown_grace_seconds);
    let realtime = state.realtime.clone();
    let app = build_app(state);
    let (stopping_tx, stopping_rx) = tokio::sync::oneshot::channel::<()>();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutdown signal received");
            realtime.shutdown();
            let _ = stopping_tx.send(());
        })
        .into_future();

    tokio::select! {
        result = server => {
            result.map_err(|e| AppError::internal(format!("Server error: {e}")))?;
        }
        _ = async {
            if stopping_rx.await.is_ok() {
                tokio::time::sleep(grace).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out");
        }
    }

    info!("HTTP server stopped");
    Ok(())
}
