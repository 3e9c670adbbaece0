//! Call History Handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::application::services::CallError;
use crate::domain::CallRecord;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn map_call_error(e: CallError) -> AppError {
    match e {
        CallError::NotFound => AppError::NotFound(e.to_string()),
        CallError::InvalidId => AppError::BadRequest(e.to_string()),
        CallError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Calls a user placed or received, newest first
pub async fn get_call_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CallRecord>>, AppError> {
    let calls = state.calls.history(&user_id).await.map_err(map_call_error)?;
    Ok(Json(calls))
}

pub async fn get_call(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> Result<Json<CallRecord>, AppError> {
    let call = state.calls.get(&call_id).await.map_err(map_call_error)?;
    Ok(Json(call))
}
