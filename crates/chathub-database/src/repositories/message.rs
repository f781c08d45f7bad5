//! PostgreSQL message repository.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};

use chathub_core::error::{AppError, ErrorKind};
use chathub_core::result::AppResult;
use chathub_core::types::id::{MessageId, UserId};
use chathub_entity::message::{Message, MessageContent};

use crate::clock::MonotonicClock;
use crate::store::MessageStore;

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, text, media_ref, seen, created_at";

/// Repository for messages and their unseen counters.
///
/// Every write that changes `seen` or adds an unseen row adjusts
/// `unseen_counters` inside the same transaction.
#[derive(Debug)]
pub struct MessageRepository {
    pool: PgPool,
    clock: MonotonicClock,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            clock: MonotonicClock::new(),
        }
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e))
    }

    async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e))
    }

    async fn decrement_unseen(
        tx: &mut Transaction<'static, Postgres>,
        from: UserId,
        to: UserId,
        by: i64,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE unseen_counters SET unseen = GREATEST(unseen - $3, 0) \
             WHERE sender_id = $1 AND receiver_id = $2",
        )
        .bind(from)
        .bind(to)
        .bind(by)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update unseen counter", e))?;
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn append(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: MessageContent,
    ) -> AppResult<Message> {
        let (text, media_ref) = content.into_parts();
        let mut tx = self.begin().await?;

        let message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (id, sender_id, receiver_id, text, media_ref, seen, created_at) \
             VALUES ($1, $2, $3, $4, $5, FALSE, $6) RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(MessageId::new())
        .bind(sender_id)
        .bind(receiver_id)
        .bind(text)
        .bind(media_ref)
        .bind(self.clock.now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert message", e))?;

        sqlx::query(
            "INSERT INTO unseen_counters (sender_id, receiver_id, unseen) VALUES ($1, $2, 1) \
             ON CONFLICT (sender_id, receiver_id) DO UPDATE SET unseen = unseen_counters.unseen + 1",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to bump unseen counter", e))?;

        Self::commit(tx).await?;
        debug!(message_id = %message.id, "Message stored");
        Ok(message)
    }

    async fn fetch(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>> {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1) \
             ORDER BY created_at ASC, seq ASC"
        ))
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch conversation", e))
    }

    async fn mark_seen(&self, message_id: MessageId) -> AppResult<()> {
        let mut tx = self.begin().await?;

        let flipped: Option<(UserId, UserId)> = sqlx::query_as(
            "UPDATE messages SET seen = TRUE WHERE id = $1 AND seen = FALSE \
             RETURNING sender_id, receiver_id",
        )
        .bind(message_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark message seen", e))?;

        match flipped {
            Some((from, to)) => Self::decrement_unseen(&mut tx, from, to, 1).await?,
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM messages WHERE id = $1)")
                        .bind(message_id)
                        .fetch_one(&mut *tx)
                        .await
                        .map_err(|e| {
                            AppError::with_source(ErrorKind::Database, "Failed to look up message", e)
                        })?;
                if !exists {
                    return Err(AppError::not_found(format!("Message {message_id} not found")));
                }
            }
        }

        Self::commit(tx).await
    }

    async fn mark_all_seen(&self, from: UserId, to: UserId) -> AppResult<u64> {
        let mut tx = self.begin().await?;

        let changed = sqlx::query(
            "UPDATE messages SET seen = TRUE \
             WHERE sender_id = $1 AND receiver_id = $2 AND seen = FALSE",
        )
        .bind(from)
        .bind(to)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark messages seen", e))?
        .rows_affected();

        if changed > 0 {
            Self::decrement_unseen(&mut tx, from, to, changed as i64).await?;
        }

        Self::commit(tx).await?;
        Ok(changed)
    }

    async fn count_unseen(&self, from: UserId, to: UserId) -> AppResult<u64> {
        let unseen: Option<i64> = sqlx::query_scalar(
            "SELECT unseen FROM unseen_counters WHERE sender_id = $1 AND receiver_id = $2",
        )
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read unseen counter", e))?;
        Ok(unseen.unwrap_or(0).max(0) as u64)
    }

    async fn find_by_id(&self, message_id: MessageId) -> AppResult<Option<Message>> {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find message", e))
    }

    async fn counterparts(&self, viewer: UserId) -> AppResult<Vec<UserId>> {
        sqlx::query_scalar(
            "SELECT DISTINCT CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END AS other \
             FROM messages WHERE sender_id = $1 OR receiver_id = $1 \
             ORDER BY other",
        )
        .bind(viewer)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list counterparts", e))
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Database health check failed", e))
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
