//! Call Repository Implementation
//!
//! PostgreSQL implementation of call history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{CallRecord, CallRecordStatus, CallRepository};
use crate::shared::error::AppError;

/// PostgreSQL call repository implementation.
pub struct PgCallRepository {
    pool: PgPool,
}

impl PgCallRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CallRow {
    id: Uuid,
    caller_id: String,
    receiver_id: String,
    status: String,
    started_at: DateTime<Utc>,
    answered_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    duration_secs: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CallRow {
    fn into_record(self) -> CallRecord {
        CallRecord {
            id: self.id,
            caller_id: self.caller_id,
            receiver_id: self.receiver_id,
            status: CallRecordStatus::from_str(&self.status),
            started_at: self.started_at,
            answered_at: self.answered_at,
            ended_at: self.ended_at,
            duration_secs: self.duration_secs,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[async_trait]
impl CallRepository for PgCallRepository {
    async fn create(&self, record: &CallRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO calls (id, caller_id, receiver_id, status, started_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(&record.caller_id)
        .bind(&record.receiver_id)
        .bind(record.status.as_str())
        .bind(record.started_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_answered(&self, id: Uuid, answered_at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE calls
            SET status = 'ongoing', answered_at = $2, updated_at = $2
            WHERE id = $1 AND status = 'initiated'
            "#,
        )
        .bind(id)
        .bind(answered_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Duration is only set for calls that were answered.
    async fn finish(&self, id: Uuid, status: CallRecordStatus, ended_at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE calls
            SET status = $2,
                ended_at = $3,
                updated_at = $3,
                duration_secs = CASE
                    WHEN answered_at IS NULL THEN NULL
                    ELSE GREATEST(0, EXTRACT(EPOCH FROM ($3 - answered_at))::BIGINT)
                END
            WHERE id = $1 AND status IN ('initiated', 'ongoing')
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(ended_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CallRecord>, AppError> {
        let row = sqlx::query_as::<_, CallRow>(
            r#"
            SELECT id, caller_id, receiver_id, status, started_at, answered_at,
                   ended_at, duration_secs, created_at, updated_at
            FROM calls
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_record()))
    }

    async fn find_by_participant(&self, user_id: &str) -> Result<Vec<CallRecord>, AppError> {
        let rows = sqlx::query_as::<_, CallRow>(
            r#"
            SELECT id, caller_id, receiver_id, status, started_at, answered_at,
                   ended_at, duration_secs, created_at, updated_at
            FROM calls
            WHERE caller_id = $1 OR receiver_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_record()).collect())
    }
}
