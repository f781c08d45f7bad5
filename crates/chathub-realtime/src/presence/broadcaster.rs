//! Pushes the full online set to every registered connection.

use std::sync::Arc;

use tracing::debug;

use crate::message::types::OutboundMessage;
use crate::metrics::RealtimeMetrics;

use super::registry::PresenceRegistry;

/// Sends `online_users` frames after presence changes.
#[derive(Debug)]
pub struct PresenceBroadcaster {
    registry: Arc<PresenceRegistry>,
    metrics: Arc<RealtimeMetrics>,
}

impl PresenceBroadcaster {
    /// Creates a broadcaster over `registry`.
    pub fn new(registry: Arc<PresenceRegistry>, metrics: Arc<RealtimeMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// Pushes the current snapshot to every registered connection.
    ///
    /// Returns how many connections accepted the frame. Failures are left
    /// for the heartbeat and reaper to clean up.
    pub fn broadcast(&self) -> usize {
        let user_ids = self.registry.snapshot();
        let online = user_ids.len();
        let msg = OutboundMessage::OnlineUsers { user_ids };

        let handles = self.registry.handles();
        let delivered = handles.iter().filter(|h| h.send(msg.clone())).count();

        self.metrics.presence_broadcast();
        debug!(
            online,
            delivered,
            failed = handles.len() - delivered,
            "Presence broadcast"
        );
        delivered
    }
}
