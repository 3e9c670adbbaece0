//! Request DTOs
//!
//! Data structures for API request bodies and query strings.

use serde::Deserialize;
use validator::Validate;

use crate::application::services::NewMessageDto;

/// Send message request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub sender: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub receiver: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub message: String,

    #[serde(default)]
    pub soft_deleted_by: Vec<String>,
}

impl From<SendMessageRequest> for NewMessageDto {
    fn from(request: SendMessageRequest) -> Self {
        Self {
            sender: request.sender,
            receiver: request.receiver,
            message: request.message,
            soft_deleted_by: request.soft_deleted_by,
        }
    }
}

/// Soft delete request; hides the conversation with `user_id` for `current_user_id`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SoftDeleteRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "User ID is required"))]
    pub user_id: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Current user ID is required"))]
    pub current_user_id: String,
}

/// `?currentUserId=` on conversation reads
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQuery {
    pub current_user_id: Option<String>,
}
