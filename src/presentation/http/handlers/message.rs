//! Message Handlers
//!
//! `/api/chat` endpoints: send, conversation reads and soft deletion.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use crate::application::dto::request::{ConversationQuery, SendMessageRequest, SoftDeleteRequest};
use crate::application::dto::response::{SendMessageResponse, SuccessResponse};
use crate::application::relay::RelayedMessage;
use crate::application::services::MessageError;
use crate::domain::ChatMessage;
use crate::shared::error::AppError;
use crate::shared::validation::{require_param, validation_error};
use crate::startup::AppState;

const CURRENT_USER_REQUIRED: &str = "Current user ID is required";

fn map_message_error(e: MessageError) -> AppError {
    match e {
        MessageError::MissingFields | MessageError::MissingCurrentUser => AppError::BadRequest(e.to_string()),
        MessageError::NotFound => AppError::NotFound(e.to_string()),
        MessageError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Persist a message, then push it to whoever is online
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    let saved = state
        .messages
        .send_message(body.into())
        .await
        .map_err(map_message_error)?;

    if let Err(e) = state.relay.deliver(RelayedMessage::from(saved.clone()), None).await {
        tracing::warn!(message_id = %saved.id, error = %e, "Message stored but not relayed");
    }

    Ok(Json(SendMessageResponse::sent(saved)))
}

/// Conversation without messages the current user hid
pub async fn get_messages(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let current_user_id = require_param(query.current_user_id, CURRENT_USER_REQUIRED)?;

    let messages = state
        .messages
        .get_conversation(&user_id, &current_user_id)
        .await
        .map_err(map_message_error)?;

    Ok(Json(messages))
}

/// Full conversation, soft-deleted messages included
pub async fn get_message_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let current_user_id = require_param(query.current_user_id, CURRENT_USER_REQUIRED)?;

    let messages = state
        .messages
        .get_history(&user_id, &current_user_id)
        .await
        .map_err(map_message_error)?;

    Ok(Json(messages))
}

pub async fn get_last_message(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<ChatMessage>, AppError> {
    let current_user_id = require_param(query.current_user_id, CURRENT_USER_REQUIRED)?;

    let message = state
        .messages
        .get_last_message(&user_id, &current_user_id)
        .await
        .map_err(map_message_error)?;

    Ok(Json(message))
}

pub async fn soft_delete(
    State(state): State<AppState>,
    Json(body): Json<SoftDeleteRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    hide_conversation(&state, body).await?;
    Ok(Json(SuccessResponse::new("Chat history soft deleted")))
}

/// Same effect as `soft_delete`, triggered by the client rather than the user
pub async fn auto_soft_delete(
    State(state): State<AppState>,
    Json(body): Json<SoftDeleteRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    hide_conversation(&state, body).await?;
    Ok(Json(SuccessResponse::new("Chat automatically soft deleted")))
}

async fn hide_conversation(state: &AppState, body: SoftDeleteRequest) -> Result<u64, AppError> {
    body.validate().map_err(validation_error)?;

    state
        .messages
        .soft_delete_conversation(&body.user_id, &body.current_user_id)
        .await
        .map_err(map_message_error)
}
