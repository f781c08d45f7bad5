//! In-memory message store.
//!
//! Messages are sharded by conversation: each conversation holds its own
//! history and unseen counters behind one map entry, so writers on
//! unrelated conversations never contend. Counters are updated under the
//! same entry lock as the records they count.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::types::id::{MessageId, UserId};
use chathub_entity::message::{ConversationKey, Message, MessageContent};

use super::MessageStore;
use crate::clock::MonotonicClock;

/// History and unseen counters of one conversation.
#[derive(Debug, Default)]
struct Conversation {
    /// Messages in insertion order, which is also `created_at` order.
    messages: Vec<Message>,
    /// Receiver → number of unseen messages addressed to them.
    unseen: HashMap<UserId, u64>,
}

impl Conversation {
    fn record_seen(&mut self, receiver: UserId, count: u64) {
        if let Some(counter) = self.unseen.get_mut(&receiver) {
            *counter = counter.saturating_sub(count);
        }
    }
}

/// Process-local [`MessageStore`].
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    /// Conversation → its messages.
    conversations: DashMap<ConversationKey, Conversation>,
    /// Message ID → (conversation, position) for direct lookup.
    index: DashMap<MessageId, (ConversationKey, usize)>,
    clock: MonotonicClock,
}

impl MemoryMessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored messages.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the store holds no messages.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn append(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: MessageContent,
    ) -> AppResult<Message> {
        let key = ConversationKey::new(sender_id, receiver_id);
        let (text, media_ref) = content.into_parts();

        let (message, position) = {
            let mut conversation = self.conversations.entry(key).or_default();
            // Timestamp taken under the entry lock keeps history order and
            // created_at order identical.
            let message = Message {
                id: MessageId::new(),
                sender_id,
                receiver_id,
                text,
                media_ref,
                seen: false,
                created_at: self.clock.now(),
            };
            let position = conversation.messages.len();
            conversation.messages.push(message.clone());
            *conversation.unseen.entry(receiver_id).or_insert(0) += 1;
            (message, position)
        };

        self.index.insert(message.id, (key, position));
        Ok(message)
    }

    async fn fetch(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>> {
        Ok(self
            .conversations
            .get(&ConversationKey::new(a, b))
            .map(|c| c.messages.clone())
            .unwrap_or_default())
    }

    async fn mark_seen(&self, message_id: MessageId) -> AppResult<()> {
        let (key, position) = self
            .index
            .get(&message_id)
            .map(|entry| *entry.value())
            .ok_or_else(|| AppError::not_found(format!("Message {message_id} not found")))?;

        let mut conversation = self
            .conversations
            .get_mut(&key)
            .ok_or_else(|| AppError::internal(format!("Message {message_id} lost its conversation")))?;

        let flipped = match conversation.messages.get_mut(position) {
            Some(message) => message.mark_seen().then_some(message.receiver_id),
            None => {
                return Err(AppError::internal(format!(
                    "Message {message_id} index out of range"
                )));
            }
        };

        if let Some(receiver) = flipped {
            conversation.record_seen(receiver, 1);
        }
        Ok(())
    }

    async fn mark_all_seen(&self, from: UserId, to: UserId) -> AppResult<u64> {
        let Some(mut conversation) = self.conversations.get_mut(&ConversationKey::new(from, to))
        else {
            return Ok(0);
        };

        let mut changed = 0u64;
        for message in conversation
            .messages
            .iter_mut()
            .filter(|m| m.is_unseen_from(from, to))
        {
            message.mark_seen();
            changed += 1;
        }

        conversation.record_seen(to, changed);
        Ok(changed)
    }

    async fn count_unseen(&self, from: UserId, to: UserId) -> AppResult<u64> {
        Ok(self
            .conversations
            .get(&ConversationKey::new(from, to))
            .and_then(|c| c.unseen.get(&to).copied())
            .unwrap_or(0))
    }

    async fn find_by_id(&self, message_id: MessageId) -> AppResult<Option<Message>> {
        let Some((key, position)) = self.index.get(&message_id).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self
            .conversations
            .get(&key)
            .and_then(|c| c.messages.get(position).cloned()))
    }

    async fn counterparts(&self, viewer: UserId) -> AppResult<Vec<UserId>> {
        let mut others: Vec<UserId> = self
            .conversations
            .iter()
            .filter_map(|entry| entry.key().other(viewer))
            .collect();
        others.sort();
        Ok(others)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
