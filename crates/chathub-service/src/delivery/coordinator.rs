//! Delivery coordinator: store first, then push to the receiver if online.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::types::id::UserId;
use chathub_database::MessageStore;
use chathub_entity::message::{MediaRef, Message};
use chathub_realtime::connection::events::ConnectionEvent;
use chathub_realtime::message::types::OutboundMessage;
use chathub_realtime::metrics::RealtimeMetrics;
use chathub_realtime::presence::registry::PresenceRegistry;
use chathub_realtime::server::RealtimeEngine;

/// What happened to the real-time push of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Queued on the receiver's live connection.
    Pushed,
    /// The receiver had no registered connection.
    Offline,
    /// The receiver was registered but the push failed.
    Dropped,
}

/// Sends messages: persists, then pushes a `new_message` frame to the
/// receiver's current connection.
///
/// A push failure never fails the send. If it reveals a dead connection,
/// a liveness-lost event is raised so the registry entry gets reaped.
#[derive(Debug, Clone)]
pub struct DeliveryCoordinator {
    store: Arc<dyn MessageStore>,
    registry: Arc<PresenceRegistry>,
    events: mpsc::Sender<ConnectionEvent>,
    metrics: Arc<RealtimeMetrics>,
}

impl DeliveryCoordinator {
    /// Creates a coordinator from its parts.
    pub fn new(
        store: Arc<dyn MessageStore>,
        registry: Arc<PresenceRegistry>,
        events: mpsc::Sender<ConnectionEvent>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            store,
            registry,
            events,
            metrics,
        }
    }

    /// Creates a coordinator wired to a running engine.
    pub fn with_engine(store: Arc<dyn MessageStore>, engine: &RealtimeEngine) -> Self {
        Self::new(
            store,
            engine.registry.clone(),
            engine.events(),
            engine.metrics.clone(),
        )
    }

    /// Stores a message from `sender` to `receiver` and pushes it if the
    /// receiver is online.
    ///
    /// Fails with `InvalidContent` when both parts are empty and with
    /// `DeliveryFailed` when the store rejects the write. Nothing is pushed
    /// in either case.
    pub async fn send(
        &self,
        sender: UserId,
        receiver: UserId,
        text: Option<String>,
        media_ref: Option<MediaRef>,
    ) -> AppResult<Message> {
        let message = self
            .store
            .append_parts(sender, receiver, text, media_ref)
            .await
            .map_err(|e| {
                if e.is_content_error() {
                    e
                } else {
                    warn!(sender = %sender, receiver = %receiver, error = %e, "Message not stored");
                    let message = format!("Message could not be stored: {}", e.message);
                    AppError::delivery_failed(message, e)
                }
            })?;

        let status = self.deliver(&message);
        debug!(message_id = %message.id, ?status, "Message sent");
        Ok(message)
    }

    /// Pushes an already stored message to its receiver's connection.
    pub fn deliver(&self, message: &Message) -> DeliveryStatus {
        let Some(handle) = self.registry.lookup(message.receiver_id) else {
            return DeliveryStatus::Offline;
        };

        let frame = OutboundMessage::NewMessage {
            message: message.clone(),
        };
        if handle.send(frame) {
            self.metrics.message_pushed();
            return DeliveryStatus::Pushed;
        }

        self.metrics.push_dropped();
        if !handle.is_alive() {
            info!(
                receiver = %message.receiver_id,
                conn_id = %handle.id,
                "Push hit a closed connection, reaping"
            );
            // If the queue is full the reaper picks the dead handle up.
            let _ = self.events.try_send(ConnectionEvent::liveness_lost(&handle));
        }
        DeliveryStatus::Dropped
    }
}
