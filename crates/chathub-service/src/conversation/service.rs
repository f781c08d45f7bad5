//! Conversation reads and seen-state updates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::types::id::{MessageId, UserId};
use chathub_database::MessageStore;
use chathub_entity::message::Message;

/// A conversation as returned to the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    /// Every message between viewer and counterpart, oldest first.
    pub messages: Vec<Message>,
    /// How many messages from the counterpart this read marked seen.
    pub marked_seen: u64,
}

/// Opens conversations and updates seen state.
#[derive(Debug, Clone)]
pub struct ConversationService {
    store: Arc<dyn MessageStore>,
}

impl ConversationService {
    /// Creates a new conversation service.
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Opens the conversation between `viewer` and `other`.
    ///
    /// Everything `other` sent the viewer is marked seen first, so the
    /// returned history already reflects the read.
    pub async fn open(&self, viewer: UserId, other: UserId) -> AppResult<ConversationView> {
        let marked_seen = self.store.mark_all_seen(other, viewer).await?;
        let messages = self.store.fetch(viewer, other).await?;

        debug!(
            viewer = %viewer,
            other = %other,
            count = messages.len(),
            marked_seen,
            "Conversation opened"
        );

        Ok(ConversationView {
            messages,
            marked_seen,
        })
    }

    /// Marks one message seen. Idempotent.
    pub async fn mark_seen(&self, message_id: MessageId) -> AppResult<()> {
        self.store.mark_seen(message_id).await
    }

    /// Looks up a message, failing with `NotFound` if it does not exist.
    pub async fn get_message(&self, message_id: MessageId) -> AppResult<Message> {
        self.store
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Message {message_id} not found")))
    }

    /// Every identity `viewer` has exchanged messages with.
    pub async fn counterparts(&self, viewer: UserId) -> AppResult<Vec<UserId>> {
        self.store.counterparts(viewer).await
    }
}
