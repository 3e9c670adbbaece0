//! Call history recorder.
//!
//! The relay reports call transitions here without waiting. A background
//! writer applies them to the call repository one at a time, in order, so an
//! answer can never overtake the insert of its call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::{CallRecord, CallRecordStatus, CallRepository};

/// A single call history update.
#[derive(Debug, Clone, PartialEq)]
pub enum CallLogEntry {
    Started(CallRecord),
    Answered {
        call_id: Uuid,
        at: DateTime<Utc>,
    },
    Finished {
        call_id: Uuid,
        status: CallRecordStatus,
        at: DateTime<Utc>,
    },
}

/// Fire-and-forget front of the call history writer.
#[derive(Debug, Clone)]
pub struct CallRecorder {
    tx: Option<mpsc::UnboundedSender<CallLogEntry>>,
}

impl CallRecorder {
    /// Recorder feeding an arbitrary channel.
    pub fn new(tx: mpsc::UnboundedSender<CallLogEntry>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Recorder that drops every entry.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Start the background writer for `repo`.
    pub fn spawn<R>(repo: Arc<R>) -> (Self, JoinHandle<()>)
    where
        R: CallRepository + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(run_writer(repo, rx));
        (Self::new(tx), writer)
    }

    pub fn started(&self, call_id: Uuid, caller_id: &str, receiver_id: &str) {
        let record = CallRecord::initiated(call_id, caller_id.to_string(), receiver_id.to_string(), Utc::now());
        self.push(CallLogEntry::Started(record));
    }

    pub fn answered(&self, call_id: Uuid) {
        self.push(CallLogEntry::Answered {
            call_id,
            at: Utc::now(),
        });
    }

    pub fn finished(&self, call_id: Uuid, status: CallRecordStatus) {
        self.push(CallLogEntry::Finished {
            call_id,
            status,
            at: Utc::now(),
        });
    }

    fn push(&self, entry: CallLogEntry) {
        if let Some(tx) = &self.tx {
            if tx.send(entry).is_err() {
                tracing::warn!("Call history writer stopped, entry dropped");
            }
        }
    }
}

async fn run_writer<R>(repo: Arc<R>, mut rx: mpsc::UnboundedReceiver<CallLogEntry>)
where
    R: CallRepository + ?Sized,
{
    while let Some(entry) = rx.recv().await {
        let result = match &entry {
            CallLogEntry::Started(record) => repo.create(record).await,
            CallLogEntry::Answered { call_id, at } => repo.mark_answered(*call_id, *at).await,
            CallLogEntry::Finished { call_id, status, at } => repo.finish(*call_id, *status, *at).await,
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, entry = ?entry, "Failed to record call history");
        }
    }
    tracing::debug!("Call history writer stopped");
}
