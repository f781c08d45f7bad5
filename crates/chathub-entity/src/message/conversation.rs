//! Unordered pair of participants.

use serde::{Deserialize, Serialize};

use chathub_core::types::id::UserId;

/// Key identifying the conversation between two identities, regardless of
/// who sent what.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    low: UserId,
    high: UserId,
}

impl ConversationKey {
    /// Build the key for the pair `{a, b}`.
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// The participant that is not `user`.
    ///
    /// For a conversation with oneself this is `user` again.
    pub fn other(&self, user: UserId) -> Option<UserId> {
        if self.low == user {
            Some(self.high)
        } else if self.high == user {
            Some(self.low)
        } else {
            None
        }
    }
}
