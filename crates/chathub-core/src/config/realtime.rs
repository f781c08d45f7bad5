//! Real-time presence and delivery configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound queue capacity per connection.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Capacity of the connection lifecycle event queue.
    #[serde(default = "default_event_queue")]
    pub event_queue_size: usize,
    /// Interval between server pings in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Silence after which a connection is considered dead, in seconds.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_seconds: u64,
    /// Interval between reaper sweeps in seconds.
    #[serde(default = "default_reaper_interval")]
    pub reaper_interval_seconds: u64,
    /// Maximum accepted inbound frame size in bytes.
    #[serde(default = "default_max_inbound")]
    pub max_inbound_message_bytes: usize,
}

impl RealtimeConfig {
    /// Ping interval as a [`Duration`].
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_seconds)
    }

    /// Liveness timeout as a [`Duration`].
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_seconds)
    }

    /// Reaper sweep interval as a [`Duration`].
    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_seconds)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            event_queue_size: default_event_queue(),
            ping_interval_seconds: default_ping_interval(),
            ping_timeout_seconds: default_ping_timeout(),
            reaper_interval_seconds: default_reaper_interval(),
            max_inbound_message_bytes: default_max_inbound(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_event_queue() -> usize {
    1024
}

fn default_ping_interval() -> u64 {
    25
}

fn default_ping_timeout() -> u64 {
    60
}

fn default_reaper_interval() -> u64 {
    15
}

fn default_max_inbound() -> usize {
    65_536
}
