//! Relay Event Types
//!
//! Inbound and outbound socket events. Frames are JSON objects of the form
//! `{"event": "<name>", "data": <payload>}`; payload fields are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{ChatMessage, DeliveryStatus};

/// Events a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    RegisterUser(String),
    SendMessage(OutgoingMessage),
    InitiateCall(CallOffer),
    AcceptCall(CallOffer),
    RejectCall(CallParties),
    EndCall(CallParties),
    Signal(SignalRequest),
}

impl ClientEvent {
    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::RegisterUser(_) => "registerUser",
            ClientEvent::SendMessage(_) => "sendMessage",
            ClientEvent::InitiateCall(_) => "initiateCall",
            ClientEvent::AcceptCall(_) => "acceptCall",
            ClientEvent::RejectCall(_) => "rejectCall",
            ClientEvent::EndCall(_) => "endCall",
            ClientEvent::Signal(_) => "signal",
        }
    }
}

/// Chat message as typed by a client, before persistence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutgoingMessage {
    pub sender: String,
    pub receiver: String,
    #[serde(alias = "message")]
    pub text: String,
}

/// `initiateCall` / `acceptCall` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOffer {
    pub caller_id: String,
    pub receiver_id: String,
    #[serde(default)]
    pub signal_data: Value,
}

/// `rejectCall` / `endCall` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallParties {
    pub caller_id: String,
    pub receiver_id: String,
}

/// `signal` payload; `user_id` is the target.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRequest {
    pub user_id: String,
    #[serde(default)]
    pub signal: Value,
}

/// Why a call could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallFailureReason {
    Offline,
    Busy,
}

/// Events the server pushes to a connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    ReceiveMessage(RelayedMessage),
    #[serde(rename_all = "camelCase")]
    IncomingCall { caller_id: String, signal_data: Value },
    #[serde(rename_all = "camelCase")]
    CallAccepted { signal_data: Value },
    #[serde(rename_all = "camelCase")]
    CallRejected { receiver_id: String },
    /// `user_id` is the party that hung up or disconnected
    #[serde(rename_all = "camelCase")]
    CallEnded { user_id: String },
    #[serde(rename_all = "camelCase")]
    CallFailed {
        receiver_id: String,
        reason: CallFailureReason,
    },
    /// `user_id` is the sender, when the sending connection is registered
    #[serde(rename_all = "camelCase")]
    Signal { user_id: Option<String>, signal: Value },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::ReceiveMessage(_) => "receiveMessage",
            ServerEvent::IncomingCall { .. } => "incomingCall",
            ServerEvent::CallAccepted { .. } => "callAccepted",
            ServerEvent::CallRejected { .. } => "callRejected",
            ServerEvent::CallEnded { .. } => "callEnded",
            ServerEvent::CallFailed { .. } => "callFailed",
            ServerEvent::Signal { .. } => "signal",
        }
    }
}

/// Message content pushed to live connections.
///
/// Persisted messages carry their id and timestamps; a message whose save
/// failed is still relayed, without them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub sender: String,
    pub receiver: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<ChatMessage> for RelayedMessage {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: Some(message.id),
            sender: message.sender,
            receiver: message.receiver,
            message: message.message,
            status: Some(message.status),
            created_at: Some(message.created_at),
        }
    }
}

impl From<OutgoingMessage> for RelayedMessage {
    fn from(message: OutgoingMessage) -> Self {
        Self {
            id: None,
            sender: message.sender,
            receiver: message.receiver,
            message: message.text,
            status: None,
            created_at: None,
        }
    }
}
