//! Call Service
//!
//! Read side of call history. Records are written by the relay's call recorder.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{CallRecord, CallRepository};

#[async_trait]
pub trait CallService: Send + Sync {
    /// Calls a user placed or received, newest first
    async fn history(&self, user_id: &str) -> Result<Vec<CallRecord>, CallError>;

    /// A single call by id
    async fn get(&self, call_id: &str) -> Result<CallRecord, CallError>;
}

/// Call service errors
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("Call not found")]
    NotFound,

    #[error("Invalid call ID")]
    InvalidId,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub struct CallServiceImpl<C>
where
    C: CallRepository + ?Sized,
{
    call_repo: Arc<C>,
}

impl<C> CallServiceImpl<C>
where
    C: CallRepository + ?Sized,
{
    pub fn new(call_repo: Arc<C>) -> Self {
        Self { call_repo }
    }
}

#[async_trait]
impl<C> CallService for CallServiceImpl<C>
where
    C: CallRepository + ?Sized + 'static,
{
    async fn history(&self, user_id: &str) -> Result<Vec<CallRecord>, CallError> {
        self.call_repo
            .find_by_participant(user_id)
            .await
            .map_err(|e| CallError::Internal(e.to_string()))
    }

    async fn get(&self, call_id: &str) -> Result<CallRecord, CallError> {
        let id = Uuid::parse_str(call_id).map_err(|_| CallError::InvalidId)?;

        self.call_repo
            .find_by_id(id)
            .await
            .map_err(|e| CallError::Internal(e.to_string()))?
            .ok_or(CallError::NotFound)
    }
}
