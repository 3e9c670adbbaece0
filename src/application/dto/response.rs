//! Response DTOs
//!
//! Data structures for API response bodies. Entities serialize themselves;
//! these wrap them where the API adds an envelope.

use serde::Serialize;

use crate::domain::ChatMessage;

/// `POST /api/chat/send` response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub success: bool,
    pub message: String,
    pub new_message: ChatMessage,
}

impl SendMessageResponse {
    pub fn sent(new_message: ChatMessage) -> Self {
        Self {
            success: true,
            message: "Message sent successfully".to_string(),
            new_message,
        }
    }
}

/// Generic `{success, message}` acknowledgement
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
