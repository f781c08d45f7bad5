//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tokio::time::Instant;

use chathub_core::types::id::{ConnectionId, UserId};

use crate::message::types::OutboundMessage;

/// A handle to a single live connection.
///
/// Holds the sender for pushing messages to the client's writer task, plus
/// liveness state consulted by the heartbeat and the reaper. Marking the
/// handle dead drops the sender, which ends the writer and with it the
/// transport.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Identity that owns this connection
    pub user_id: UserId,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    sender: Mutex<Option<mpsc::Sender<OutboundMessage>>>,
    /// Last inbound traffic of any kind
    last_seen: RwLock<Instant>,
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(user_id: UserId, sender: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id: ConnectionId::new(),
            user_id,
            connected_at: Utc::now(),
            sender: Mutex::new(Some(sender)),
            last_seen: RwLock::new(Instant::now()),
            alive: AtomicBool::new(true),
        }
    }

    /// Queue an outbound message for this connection.
    ///
    /// Returns `false` if the message was not queued. A closed writer marks
    /// the handle dead; a full buffer only drops this message.
    pub fn send(&self, msg: OutboundMessage) -> bool {
        let result = match self.lock_sender().as_ref() {
            Some(sender) => sender.try_send(msg),
            None => return false,
        };
        match result {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(msg)) => {
                tracing::warn!(
                    conn_id = %self.id,
                    kind = msg.kind(),
                    "Connection send buffer full, dropping message"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead and release the writer channel
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.lock_sender().take();
    }

    fn lock_sender(&self) -> MutexGuard<'_, Option<mpsc::Sender<OutboundMessage>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record inbound traffic
    pub async fn touch(&self) {
        *self.last_seen.write().await = Instant::now();
    }

    /// Time since the last inbound traffic
    pub async fn idle_for(&self) -> Duration {
        self.last_seen.read().await.elapsed()
    }
}
