//! Connection lifecycle events.
//!
//! Every presence change goes through one of these, consumed in order by
//! the [`ConnectionManager`](super::ConnectionManager) event loop.

use std::sync::Arc;

use chathub_core::types::id::{ConnectionId, UserId};

use super::handle::ConnectionHandle;

/// A change in the lifecycle of one connection.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// A connection finished its handshake.
    Opened(Arc<ConnectionHandle>),
    /// The transport closed normally.
    Closed {
        /// Owner of the connection.
        user_id: UserId,
        /// The connection that closed.
        connection_id: ConnectionId,
    },
    /// The connection stopped answering or a push to it failed.
    LivenessLost {
        /// Owner of the connection.
        user_id: UserId,
        /// The connection that went stale.
        connection_id: ConnectionId,
    },
}

impl ConnectionEvent {
    /// Closed event for `handle`.
    pub fn closed(handle: &ConnectionHandle) -> Self {
        Self::Closed {
            user_id: handle.user_id,
            connection_id: handle.id,
        }
    }

    /// Liveness-lost event for `handle`.
    pub fn liveness_lost(handle: &ConnectionHandle) -> Self {
        Self::LivenessLost {
            user_id: handle.user_id,
            connection_id: handle.id,
        }
    }
}
