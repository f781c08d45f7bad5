//! Response DTOs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use chathub_core::types::id::{MessageId, UserId};
use chathub_realtime::metrics::MetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Sidebar listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarResponse {
    /// Identities listed.
    pub users: Vec<UserId>,
    /// Unseen messages per listed identity; zero counts are omitted.
    pub unseen_messages: HashMap<UserId, u64>,
    /// Every identity currently online.
    pub online_users: Vec<UserId>,
}

/// Result of marking one message seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkSeenResponse {
    /// The message.
    pub message_id: MessageId,
    /// Always `true`.
    pub seen: bool,
}

/// Service status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since start.
    pub uptime_seconds: u64,
    /// Whether the message store answered.
    pub store_healthy: bool,
    /// Number of online identities.
    pub online_users: usize,
    /// Real-time counters.
    pub metrics: MetricsSnapshot,
}
