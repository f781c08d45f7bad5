//! WebSocket upgrade handler.

use axum::extract::ws::{Message as WsMessage, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, warn};

use chathub_core::types::id::UserId;
use chathub_realtime::message::serializer::serialize_outbound;

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /ws: WebSocket upgrade for an identified caller.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    auth: AuthUser,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let max_frame = state.config.realtime.max_inbound_message_bytes;
    Ok(ws
        .max_message_size(max_frame)
        .on_upgrade(move |socket| handle_ws_connection(state, auth.id(), socket)))
}

/// Drives an established WebSocket connection until either side closes.
async fn handle_ws_connection(state: AppState, user_id: UserId, socket: WebSocket) {
    let manager = state.realtime.connections.clone();
    let (handle, mut outbound_rx) = match manager.open(user_id).await {
        Ok(opened) => opened,
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Could not open connection");
            return;
        }
    };
    let conn_id = handle.id;

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Ends when the handle is marked dead, closing the socket so the client
    // reconnects.
    let mut outbound_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let text = match serialize_outbound(&msg) {
                Ok(text) => text,
                Err(e) => {
                    error!(conn_id = %conn_id, error = %e, "Failed to serialize outbound message");
                    continue;
                }
            };
            if ws_tx.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    loop {
        tokio::select! {
            _ = &mut outbound_task => {
                debug!(conn_id = %conn_id, "Writer finished, closing connection");
                break;
            }
            frame = ws_rx.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    manager.handle_inbound(&handle, text.as_str()).await;
                }
                Some(Ok(WsMessage::Pong(_))) | Some(Ok(WsMessage::Ping(_))) => handle.touch().await,
                Some(Ok(WsMessage::Binary(_))) => {
                    debug!(conn_id = %conn_id, "Ignoring binary frame");
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    manager.close(&handle).await;
    outbound_task.abort();
}
