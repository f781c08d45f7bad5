//! Message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use chathub_core::types::id::{MessageId, UserId};

use super::content::MediaRef;

/// A persisted direct message between two identities.
///
/// `seen` only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// The identity that sent the message.
    pub sender_id: UserId,
    /// The identity the message is addressed to.
    pub receiver_id: UserId,
    /// Text body, if any.
    pub text: Option<String>,
    /// Reference to an uploaded media asset, if any.
    pub media_ref: Option<MediaRef>,
    /// Whether the receiver has retrieved the conversation containing it.
    pub seen: bool,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether the message was sent `from → to` and is still unseen.
    pub fn is_unseen_from(&self, from: UserId, to: UserId) -> bool {
        !self.seen && self.sender_id == from && self.receiver_id == to
    }

    /// Flip the message to seen. Returns `true` if it was unseen before.
    pub fn mark_seen(&mut self) -> bool {
        let changed = !self.seen;
        self.seen = true;
        changed
    }
}
