//! Ping/pong heartbeat for connection keepalive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use chathub_core::config::RealtimeConfig;

use super::events::ConnectionEvent;
use super::handle::ConnectionHandle;
use crate::message::types::OutboundMessage;

/// Heartbeat configuration
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Silence after which the connection counts as lost
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: config.ping_interval(),
            ping_timeout: config.ping_timeout(),
        }
    }
}

/// Run the heartbeat loop for a connection.
///
/// Sends periodic pings and watches inbound traffic. Emits
/// [`ConnectionEvent::LivenessLost`] and stops when the client has been
/// silent for longer than the timeout or a ping cannot be queued. Stops
/// quietly once the handle is dead for any other reason.
pub async fn run_heartbeat(
    handle: Arc<ConnectionHandle>,
    config: HeartbeatConfig,
    events: mpsc::Sender<ConnectionEvent>,
) {
    let mut interval = time::interval_at(Instant::now() + config.ping_interval, config.ping_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        if !handle.is_alive() {
            break;
        }

        let idle = handle.idle_for().await;
        if idle > config.ping_timeout {
            tracing::warn!(
                conn_id = %handle.id,
                user_id = %handle.user_id,
                idle_secs = idle.as_secs(),
                "Connection heartbeat timeout"
            );
            handle.mark_dead();
            let _ = events.send(ConnectionEvent::liveness_lost(&handle)).await;
            break;
        }

        let ping = OutboundMessage::Ping {
            timestamp: Utc::now().timestamp_millis(),
        };

        if !handle.send(ping) && !handle.is_alive() {
            tracing::debug!(conn_id = %handle.id, "Ping send failed, connection lost");
            let _ = events.send(ConnectionEvent::liveness_lost(&handle)).await;
            break;
        }
    }

    tracing::debug!(conn_id = %handle.id, "Heartbeat loop ended");
}
