//! # chathub-realtime
//!
//! Real-time side of ChatHub:
//!
//! - Presence registry mapping each online identity to its live connection
//! - Connection lifecycle events consumed by a single event loop
//! - Heartbeat and periodic reaper for lost connections
//! - Full online-set broadcast after every presence change

pub mod connection;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod server;

pub use connection::{ConnectionEvent, ConnectionHandle, ConnectionManager};
pub use message::{InboundMessage, OutboundMessage};
pub use metrics::RealtimeMetrics;
pub use presence::{PresenceBroadcaster, PresenceRegistry};
pub use server::RealtimeEngine;
