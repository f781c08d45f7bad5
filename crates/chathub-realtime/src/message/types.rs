//! Inbound and outbound WebSocket message type definitions.

use serde::{Deserialize, Serialize};

use chathub_core::types::id::UserId;
use chathub_entity::message::Message;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Client keepalive; answered with a pong.
    Ping {
        /// Client timestamp, echoed back.
        #[serde(default)]
        timestamp: Option<i64>,
    },
    /// Pong response to a server ping.
    Pong {
        /// Echoed timestamp.
        #[serde(default)]
        timestamp: Option<i64>,
    },
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// The complete set of identities currently online.
    OnlineUsers {
        /// Online identities, sorted.
        #[serde(rename = "userIds")]
        user_ids: Vec<UserId>,
    },
    /// A message addressed to this connection's identity was stored.
    NewMessage {
        /// The stored message.
        message: Message,
    },
    /// Server keepalive.
    Ping {
        /// Server timestamp in milliseconds.
        timestamp: i64,
    },
    /// Answer to a client ping.
    Pong {
        /// Echoed client timestamp, or server time if none was sent.
        timestamp: i64,
    },
    /// Error message.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

impl OutboundMessage {
    /// Build an error frame.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The `type` tag of this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OnlineUsers { .. } => "online_users",
            Self::NewMessage { .. } => "new_message",
            Self::Ping { .. } => "ping",
            Self::Pong { .. } => "pong",
            Self::Error { .. } => "error",
        }
    }
}
