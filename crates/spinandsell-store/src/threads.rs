//! `ThreadRepository` for `PgMarketplaceStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spinandsell_core::error::DomainError;
use spinandsell_core::model::{Message, Thread, ThreadOpening, ThreadSummary, canonical_pair};
use spinandsell_core::repository::ThreadRepository;
use uuid::Uuid;

use crate::error::db_error;
use crate::pg_marketplace_store::PgMarketplaceStore;
use crate::rows::{MessageRow, ThreadRow, ThreadSummaryRow};

#[async_trait]
impl ThreadRepository for PgMarketplaceStore {
    async fn find_thread(&self, thread_id: Uuid) -> Result<Option<Thread>, DomainError> {
        let row = sqlx::query_as::<_, ThreadRow>("SELECT * FROM threads WHERE id = $1")
            .bind(thread_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Thread::from))
    }

    async fn find_thread_between(
        &self,
        first: Uuid,
        second: Uuid,
        listing_id: Option<Uuid>,
    ) -> Result<Option<Thread>, DomainError> {
        let (one, two) = canonical_pair(first, second);
        let row = sqlx::query_as::<_, ThreadRow>(
            "SELECT * FROM threads \
             WHERE participant_one_id = $1 AND participant_two_id = $2 \
             AND listing_id IS NOT DISTINCT FROM $3",
        )
        .bind(one)
        .bind(two)
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Thread::from))
    }

    async fn create_thread(&self, thread: &Thread) -> Result<ThreadOpening, DomainError> {
        let (one, two) = canonical_pair(thread.participant_one_id, thread.participant_two_id);
        let inserted = sqlx::query_as::<_, ThreadRow>(
            "INSERT INTO threads (id, participant_one_id, participant_two_id, listing_id, \
             created_at, last_message_at) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT DO NOTHING \
             RETURNING *",
        )
        .bind(thread.id)
        .bind(one)
        .bind(two)
        .bind(thread.listing_id)
        .bind(thread.created_at)
        .bind(thread.last_message_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        if let Some(row) = inserted {
            return Ok(ThreadOpening::Created(row.into()));
        }
        self.find_thread_between(one, two, thread.listing_id)
            .await?
            .map(ThreadOpening::Existing)
            .ok_or_else(|| {
                DomainError::Infrastructure(format!(
                    "thread {} conflicted but no existing thread was found",
                    thread.id
                ))
            })
    }

    async fn list_threads(&self, user_id: Uuid) -> Result<Vec<ThreadSummary>, DomainError> {
        let rows = sqlx::query_as::<_, ThreadSummaryRow>(
            "SELECT t.*, \
                    m.id AS last_message_id, \
                    m.sender_id AS last_message_sender_id, \
                    m.content AS last_message_content, \
                    m.read_at AS last_message_read_at, \
                    m.created_at AS last_message_created_at \
             FROM threads t \
             LEFT JOIN LATERAL ( \
                 SELECT id, sender_id, content, read_at, created_at FROM messages \
                 WHERE thread_id = t.id ORDER BY created_at DESC, id DESC LIMIT 1 \
             ) m ON TRUE \
             WHERE t.participant_one_id = $1 OR t.participant_two_id = $1 \
             ORDER BY COALESCE(t.last_message_at, t.created_at) DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(ThreadSummary::from).collect())
    }

    async fn insert_message(&self, message: &Message) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        sqlx::query(
            "INSERT INTO messages (id, thread_id, sender_id, content, read_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(message.id)
        .bind(message.thread_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(message.read_at)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        sqlx::query("UPDATE threads SET last_message_at = $2 WHERE id = $1")
            .bind(message.thread_id)
            .bind(message.created_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn list_messages(&self, thread_id: Uuid) -> Result<Vec<Message>, DomainError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT * FROM messages WHERE thread_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn mark_read(
        &self,
        thread_id: Uuid,
        reader_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE messages SET read_at = $3 \
             WHERE thread_id = $1 AND sender_id <> $2 AND read_at IS NULL",
        )
        .bind(thread_id)
        .bind(reader_id)
        .bind(read_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected())
    }
}
