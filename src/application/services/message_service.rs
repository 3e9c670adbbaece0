//! Message Service
//!
//! Persistence side of one-to-one chat: send, conversation reads and
//! per-participant soft deletion. Live delivery is the relay's job.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ChatMessage, Conversation, MessageRepository};

/// Message service trait
#[async_trait]
pub trait MessageService: Send + Sync {
    /// Validate and persist a new message
    async fn send_message(&self, request: NewMessageDto) -> Result<ChatMessage, MessageError>;

    /// Conversation between two users, oldest first, without messages `current_user_id` hid
    async fn get_conversation(&self, user_id: &str, current_user_id: &str) -> Result<Vec<ChatMessage>, MessageError>;

    /// Full conversation including soft-deleted messages
    async fn get_history(&self, user_id: &str, current_user_id: &str) -> Result<Vec<ChatMessage>, MessageError>;

    /// Most recent message between two users
    async fn get_last_message(&self, user_id: &str, current_user_id: &str) -> Result<ChatMessage, MessageError>;

    /// Hide the whole conversation for `current_user_id`; returns how many messages changed
    async fn soft_delete_conversation(&self, user_id: &str, current_user_id: &str) -> Result<u64, MessageError>;

    /// Check the message store is reachable
    async fn ping_store(&self) -> Result<(), MessageError>;
}

/// New message input
#[derive(Debug, Clone, Default)]
pub struct NewMessageDto {
    pub sender: String,
    pub receiver: String,
    pub message: String,
    pub soft_deleted_by: Vec<String>,
}

/// Message service errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Current user ID is required")]
    MissingCurrentUser,

    #[error("No messages found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// MessageService implementation
pub struct MessageServiceImpl<M>
where
    M: MessageRepository + ?Sized,
{
    message_repo: Arc<M>,
}

impl<M> MessageServiceImpl<M>
where
    M: MessageRepository + ?Sized,
{
    pub fn new(message_repo: Arc<M>) -> Self {
        Self { message_repo }
    }

    fn conversation(user_id: &str, current_user_id: &str) -> Result<Conversation, MessageError> {
        if current_user_id.trim().is_empty() {
            return Err(MessageError::MissingCurrentUser);
        }
        Ok(Conversation::new(user_id, current_user_id))
    }
}

#[async_trait]
impl<M> MessageService for MessageServiceImpl<M>
where
    M: MessageRepository + ?Sized + 'static,
{
    async fn send_message(&self, request: NewMessageDto) -> Result<ChatMessage, MessageError> {
        if request.sender.trim().is_empty() || request.receiver.trim().is_empty() || request.message.is_empty() {
            return Err(MessageError::MissingFields);
        }

        let mut message = ChatMessage::new(request.sender, request.receiver, request.message);
        message.soft_deleted_by = request.soft_deleted_by;

        let saved = self
            .message_repo
            .save(&message)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?;

        tracing::debug!(message_id = %saved.id, sender = %saved.sender, receiver = %saved.receiver, "Message stored");
        Ok(saved)
    }

    async fn get_conversation(&self, user_id: &str, current_user_id: &str) -> Result<Vec<ChatMessage>, MessageError> {
        let conversation = Self::conversation(user_id, current_user_id)?;
        self.message_repo
            .find_conversation(&conversation, Some(current_user_id.to_string()))
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))
    }

    async fn get_history(&self, user_id: &str, current_user_id: &str) -> Result<Vec<ChatMessage>, MessageError> {
        let conversation = Self::conversation(user_id, current_user_id)?;
        self.message_repo
            .find_conversation(&conversation, None)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))
    }

    async fn get_last_message(&self, user_id: &str, current_user_id: &str) -> Result<ChatMessage, MessageError> {
        let conversation = Self::conversation(user_id, current_user_id)?;
        self.message_repo
            .find_latest(&conversation)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?
            .ok_or(MessageError::NotFound)
    }

    async fn soft_delete_conversation(&self, user_id: &str, current_user_id: &str) -> Result<u64, MessageError> {
        let conversation = Self::conversation(user_id, current_user_id)?;
        let hidden = self
            .message_repo
            .mark_soft_deleted(&conversation, current_user_id)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?;

        tracing::info!(user_id, current_user_id, hidden, "Conversation soft deleted");
        Ok(hidden)
    }

    async fn ping_store(&self) -> Result<(), MessageError> {
        self.message_repo
            .ping()
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))
    }
}
