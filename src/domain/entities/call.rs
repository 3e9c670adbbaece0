//! Call record entity and repository trait.
//!
//! Maps to the `calls` table. A call record is the durable history of a call;
//! the live ringing/ongoing state lives only in the relay's session table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Lifecycle status of a recorded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CallRecordStatus {
    /// Ringing, not answered yet
    #[default]
    Initiated,
    /// Answered and in progress
    Ongoing,
    /// Answered and later hung up
    Completed,
    /// Ended before anyone answered
    Missed,
    /// Declined by the receiver
    Rejected,
}

impl CallRecordStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ongoing" => Self::Ongoing,
            "completed" => Self::Completed,
            "missed" => Self::Missed,
            "rejected" => Self::Rejected,
            _ => Self::Initiated,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Missed => "missed",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Missed | Self::Rejected)
    }
}

impl std::fmt::Display for CallRecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded one-to-one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: Uuid,
    pub caller_id: String,
    pub receiver_id: String,
    pub status: CallRecordStatus,
    pub started_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Seconds between answer and hang-up; only set for completed calls
    pub duration_secs: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallRecord {
    /// A freshly initiated call.
    pub fn initiated(id: Uuid, caller_id: String, receiver_id: String, at: DateTime<Utc>) -> Self {
        Self {
            id,
            caller_id,
            receiver_id,
            status: CallRecordStatus::Initiated,
            started_at: at,
            answered_at: None,
            ended_at: None,
            duration_secs: None,
            created_at: at,
            updated_at: at,
        }
    }

    /// Duration from answer to `ended_at`, whole seconds, never negative.
    pub fn duration_until(answered_at: Option<DateTime<Utc>>, ended_at: DateTime<Utc>) -> Option<i64> {
        answered_at.map(|answered| (ended_at - answered).num_seconds().max(0))
    }
}

/// Repository trait for call history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallRepository: Send + Sync {
    /// Insert a new call record.
    async fn create(&self, record: &CallRecord) -> Result<(), AppError>;

    /// Mark a call as answered.
    async fn mark_answered(&self, id: Uuid, answered_at: DateTime<Utc>) -> Result<(), AppError>;

    /// Close a call with a terminal status.
    ///
    /// The duration is derived from the stored answer time.
    async fn finish(&self, id: Uuid, status: CallRecordStatus, ended_at: DateTime<Utc>) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CallRecord>, AppError>;

    /// Calls the user placed or received, newest first.
    async fn find_by_participant(&self, user_id: &str) -> Result<Vec<CallRecord>, AppError>;
}
