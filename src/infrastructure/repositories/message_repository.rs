//! Message Repository Implementation
//!
//! PostgreSQL implementation of message storage. Conversations are matched in
//! both directions; soft deletion appends to the `soft_deleted_by` array.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{ChatMessage, Conversation, DeliveryStatus, MessageRepository};
use crate::shared::error::AppError;

/// PostgreSQL message repository implementation.
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for message queries.
/// Maps to the messages table schema defined in the migration.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    sender_id: String,
    receiver_id: String,
    content: String,
    soft_deleted_by: Vec<String>,
    is_deleted: bool,
    status: String,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    /// Converts database row to domain ChatMessage entity.
    fn into_message(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            sender: self.sender_id,
            receiver: self.receiver_id,
            message: self.content,
            soft_deleted_by: self.soft_deleted_by,
            is_deleted: self.is_deleted,
            status: DeliveryStatus::from_str(&self.status),
            created_at: self.created_at,
        }
    }
}

const CONVERSATION_FILTER: &str = "((sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1))";

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn save(&self, message: &ChatMessage) -> Result<ChatMessage, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, content, soft_deleted_by, is_deleted, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, sender_id, receiver_id, content, soft_deleted_by, is_deleted, status, created_at
            "#,
        )
        .bind(message.id)
        .bind(&message.sender)
        .bind(&message.receiver)
        .bind(&message.message)
        .bind(&message.soft_deleted_by)
        .bind(message.is_deleted)
        .bind(message.status.as_str())
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_message())
    }

    /// Messages are returned oldest first.
    async fn find_conversation(
        &self,
        conversation: &Conversation,
        exclude_hidden_for: Option<String>,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let (a, b) = conversation.participants();

        let sql = format!(
            r#"
            SELECT id, sender_id, receiver_id, content, soft_deleted_by, is_deleted, status, created_at
            FROM messages
            WHERE {CONVERSATION_FILTER}
              AND ($3::text IS NULL OR NOT ($3 = ANY(soft_deleted_by)))
            ORDER BY created_at ASC, id ASC
            "#
        );

        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(a)
            .bind(b)
            .bind(exclude_hidden_for)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into_message()).collect())
    }

    async fn find_latest(&self, conversation: &Conversation) -> Result<Option<ChatMessage>, AppError> {
        let (a, b) = conversation.participants();

        let sql = format!(
            r#"
            SELECT id, sender_id, receiver_id, content, soft_deleted_by, is_deleted, status, created_at
            FROM messages
            WHERE {CONVERSATION_FILTER}
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        );

        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(a)
            .bind(b)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_message()))
    }

    /// Appends `user_id` only where it is not already present.
    async fn mark_soft_deleted(&self, conversation: &Conversation, user_id: &str) -> Result<u64, AppError> {
        let (a, b) = conversation.participants();

        let sql = format!(
            r#"
            UPDATE messages
            SET soft_deleted_by = array_append(soft_deleted_by, $3)
            WHERE {CONVERSATION_FILTER}
              AND NOT ($3 = ANY(soft_deleted_by))
            "#
        );

        let result = sqlx::query(&sql)
            .bind(a)
            .bind(b)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
