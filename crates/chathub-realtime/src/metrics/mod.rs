//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    connections_reaped: AtomicU64,
    connections_superseded: AtomicU64,
    stale_disconnects: AtomicU64,
    presence_broadcasts: AtomicU64,
    messages_pushed: AtomicU64,
    pushes_dropped: AtomicU64,
    messages_received: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection finished its handshake.
    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// A registered connection closed normally.
    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// A registered connection was removed after losing liveness.
    pub fn connection_reaped(&self) {
        self.connections_reaped.fetch_add(1, Ordering::Relaxed);
    }

    /// A connection replaced an older one for the same identity.
    pub fn connection_superseded(&self) {
        self.connections_superseded.fetch_add(1, Ordering::Relaxed);
    }

    /// A disconnect arrived for a connection that was no longer registered.
    pub fn stale_disconnect(&self) {
        self.stale_disconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// An online-set broadcast went out.
    pub fn presence_broadcast(&self) {
        self.presence_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    /// A stored message was pushed to its receiver.
    pub fn message_pushed(&self) {
        self.messages_pushed.fetch_add(1, Ordering::Relaxed);
    }

    /// A push to an online receiver failed.
    pub fn push_dropped(&self) {
        self.pushes_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// An inbound frame was processed.
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            connections_reaped: self.connections_reaped.load(Ordering::Relaxed),
            connections_superseded: self.connections_superseded.load(Ordering::Relaxed),
            stale_disconnects: self.stale_disconnects.load(Ordering::Relaxed),
            presence_broadcasts: self.presence_broadcasts.load(Ordering::Relaxed),
            messages_pushed: self.messages_pushed.load(Ordering::Relaxed),
            pushes_dropped: self.pushes_dropped.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Connections that completed the handshake
    pub connections_opened: u64,
    /// Registered connections that closed normally
    pub connections_closed: u64,
    /// Registered connections removed after losing liveness
    pub connections_reaped: u64,
    /// Connections replaced by a newer one for the same identity
    pub connections_superseded: u64,
    /// Disconnects for connections no longer registered
    pub stale_disconnects: u64,
    /// Online-set broadcasts sent
    pub presence_broadcasts: u64,
    /// Stored messages pushed to online receivers
    pub messages_pushed: u64,
    /// Pushes that failed
    pub pushes_dropped: u64,
    /// Inbound frames processed
    pub messages_received: u64,
}
