//! The message store contract and backend selection.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use chathub_core::config::{AppConfig, StoreBackend};
use chathub_core::result::AppResult;
use chathub_core::types::id::{MessageId, UserId};
use chathub_entity::message::{MediaRef, Message, MessageContent};

use crate::connection::DatabasePool;
use crate::migration::run_migrations;
use crate::repositories::MessageRepository;

use self::memory::MemoryMessageStore;

/// Durable, append-only record of messages that owns seen-state transitions.
///
/// Implementations must keep [`count_unseen`](MessageStore::count_unseen)
/// equal to a full recount of unseen records at every instant, and must
/// never expose a partially applied write.
#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a new unseen message and return it with its assigned id and
    /// creation time.
    async fn append(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: MessageContent,
    ) -> AppResult<Message>;

    /// All messages exchanged between `a` and `b`, in either direction,
    /// ordered by creation time (insertion order on ties).
    async fn fetch(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>>;

    /// Mark a single message as seen. Idempotent; fails with `NotFound` for
    /// an unknown id.
    async fn mark_seen(&self, message_id: MessageId) -> AppResult<()>;

    /// Atomically mark every unseen `from → to` message as seen and return
    /// how many changed.
    async fn mark_all_seen(&self, from: UserId, to: UserId) -> AppResult<u64>;

    /// Number of unseen `from → to` messages.
    async fn count_unseen(&self, from: UserId, to: UserId) -> AppResult<u64>;

    /// Look up a message by id.
    async fn find_by_id(&self, message_id: MessageId) -> AppResult<Option<Message>>;

    /// Every identity `viewer` has exchanged at least one message with.
    async fn counterparts(&self, viewer: UserId) -> AppResult<Vec<UserId>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Release backend resources on shutdown.
    async fn close(&self) {}

    /// Validate raw parts and append. Fails with `InvalidContent` when both
    /// parts are empty.
    async fn append_parts(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        text: Option<String>,
        media_ref: Option<MediaRef>,
    ) -> AppResult<Message> {
        let content = MessageContent::new(text, media_ref)?;
        self.append(sender_id, receiver_id, content).await
    }
}

/// Build the store selected by `config.store.backend`.
///
/// The PostgreSQL backend connects and runs pending migrations first.
pub async fn connect(config: &AppConfig) -> AppResult<Arc<dyn MessageStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory message store");
            Ok(Arc::new(MemoryMessageStore::new()))
        }
        StoreBackend::Postgres => {
            let db = DatabasePool::connect(&config.database).await?;
            run_migrations(db.pool()).await?;
            info!("Using PostgreSQL message store");
            Ok(Arc::new(MessageRepository::new(db.pool().clone())))
        }
    }
}
