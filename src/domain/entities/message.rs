//! Message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Conversation;
use crate::shared::error::AppError;

/// Delivery status of a message, matching the `status` column check constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl DeliveryStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "delivered" => Self::Delivered,
            "read" => Self::Read,
            _ => Self::Sent,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A one-to-one chat message.
///
/// Maps to the `messages` table:
/// - id: UUID PRIMARY KEY (v7, time ordered)
/// - sender_id / receiver_id: TEXT NOT NULL
/// - content: TEXT NOT NULL
/// - soft_deleted_by: TEXT[] NOT NULL DEFAULT '{}'
/// - is_deleted: BOOLEAN NOT NULL DEFAULT FALSE
/// - status: TEXT NOT NULL DEFAULT 'sent'
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: String,
    pub receiver: String,
    /// Message text
    pub message: String,
    /// Participants who hid this message from their own history
    pub soft_deleted_by: Vec<String>,
    pub is_deleted: bool,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a fresh, not yet persisted message.
    pub fn new(sender: String, receiver: String, message: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            sender,
            receiver,
            message,
            soft_deleted_by: Vec::new(),
            is_deleted: false,
            status: DeliveryStatus::default(),
            created_at: Utc::now(),
        }
    }

    /// Whether `user_id` has hidden this message.
    pub fn is_hidden_for(&self, user_id: &str) -> bool {
        self.soft_deleted_by.iter().any(|u| u == user_id)
    }

    pub fn conversation(&self) -> Conversation {
        Conversation::new(self.sender.clone(), self.receiver.clone())
    }
}

/// Repository trait for message storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message and return the stored record.
    async fn save(&self, message: &ChatMessage) -> Result<ChatMessage, AppError>;

    /// All messages of a conversation, oldest first.
    ///
    /// When `exclude_hidden_for` is set, messages that user soft-deleted are skipped.
    async fn find_conversation(
        &self,
        conversation: &Conversation,
        exclude_hidden_for: Option<String>,
    ) -> Result<Vec<ChatMessage>, AppError>;

    /// Most recent message of a conversation.
    async fn find_latest(&self, conversation: &Conversation) -> Result<Option<ChatMessage>, AppError>;

    /// Hide every message of the conversation for `user_id`.
    ///
    /// Returns the number of messages newly hidden.
    async fn mark_soft_deleted(&self, conversation: &Conversation, user_id: &str) -> Result<u64, AppError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), AppError>;
}
