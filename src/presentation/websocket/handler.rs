//! WebSocket Connection Handler
//!
//! Bridges one socket to the relay. Frames are JSON `{"event", "data"}`
//! objects; see `application::relay::events`.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::time::{interval, timeout};

use super::session::ConnectionSession;
use crate::application::relay::{ClientEvent, ConnectionHandle, OutgoingMessage, RelayError, RelayedMessage};
use crate::application::services::{MessageError, NewMessageDto};
use crate::infrastructure::metrics;
use crate::startup::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let limits = &state.settings.websocket;
    ws.max_message_size(limits.max_message_size)
        .max_frame_size(limits.max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (handle, mut outbound) = ConnectionHandle::channel();
    let mut session = ConnectionSession::new(handle.id());
    let connection_id = session.connection_id;

    metrics::websocket_connected();
    tracing::debug!(connection_id = %connection_id, "New WebSocket connection");

    let heartbeat = Duration::from_millis(state.settings.websocket.heartbeat_interval_ms);
    let idle_timeout = Duration::from_secs(state.settings.websocket.idle_timeout_secs);

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Forward relay events to the socket and keep the connection pinged
    let sender_task = tokio::spawn(async move {
        let mut ping = interval(heartbeat);
        ping.tick().await; // Skip first immediate tick

        loop {
            tokio::select! {
                event = outbound.recv() => {
                    let Some(event) = event else { break };
                    let text = match serde_json::to_string(&event) {
                        Ok(t) => t,
                        Err(e) => {
                            tracing::error!(event = event.name(), error = %e, "Failed to serialize event");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
        let _ = sender.close().await;
    });

    let mut idle_check = interval(heartbeat);
    idle_check.tick().await;

    // Main message loop
    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        session.record_frame();
                        if let Err(e) = handle_text(&text, &handle, &mut session, &state).await {
                            tracing::error!(connection_id = %connection_id, error = %e, "Relay unavailable, closing connection");
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        session.touch();
                        tracing::debug!(connection_id = %connection_id, "Ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        // Pong replies are handled automatically by axum
                        session.touch();
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %connection_id, "Connection closed");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            _ = idle_check.tick() => {
                if !session.is_alive(idle_timeout) {
                    tracing::info!(connection_id = %connection_id, "Idle timeout, closing connection");
                    break;
                }
            }
        }
    }

    // Cleanup
    if let Err(e) = state.relay.disconnect(handle).await {
        tracing::warn!(connection_id = %connection_id, error = %e, "Disconnect not delivered to relay");
    }
    sender_task.abort();
    metrics::websocket_disconnected();

    tracing::info!(
        connection_id = %connection_id,
        user_id = session.user_id.as_deref().unwrap_or("-"),
        frames = session.frames_received,
        "WebSocket disconnected"
    );
}

/// Parse one text frame and hand it to the relay.
///
/// `sendMessage` is stored first and then delivered with `handle` as the echo
/// target. Unparseable frames are logged and skipped. Only a stopped relay is
/// an error.
pub async fn handle_text(
    text: &str,
    handle: &ConnectionHandle,
    session: &mut ConnectionSession,
    state: &AppState,
) -> Result<(), RelayError> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(connection_id = %session.connection_id, error = %e, "Malformed frame ignored");
            metrics::record_relay_event("unknown", "malformed");
            return Ok(());
        }
    };

    match event {
        ClientEvent::SendMessage(message) => {
            let Some(relayed) = persist(message, state).await else {
                return Ok(());
            };
            state.relay.deliver(relayed, Some(handle.clone())).await
        }
        ClientEvent::RegisterUser(user_id) => {
            session.user_id = Some(user_id.trim().to_string());
            state
                .relay
                .submit(handle.clone(), ClientEvent::RegisterUser(user_id))
                .await
        }
        other => state.relay.submit(handle.clone(), other).await,
    }
}

/// Store a socket-sent message before relaying it.
///
/// The reader loop waits here, so the save is bounded by
/// `websocket.persist_timeout_ms`. A store failure or timeout does not block
/// live delivery; the message goes out without an id. Messages with missing
/// fields are dropped.
async fn persist(message: OutgoingMessage, state: &AppState) -> Option<RelayedMessage> {
    let request = NewMessageDto {
        sender: message.sender.clone(),
        receiver: message.receiver.clone(),
        message: message.text.clone(),
        soft_deleted_by: Vec::new(),
    };

    let limit = Duration::from_millis(state.settings.websocket.persist_timeout_ms);

    match timeout(limit, state.messages.send_message(request)).await {
        Ok(Ok(saved)) => Some(saved.into()),
        Ok(Err(MessageError::MissingFields)) => {
            tracing::debug!(sender = %message.sender, "Dropped socket message with missing fields");
            None
        }
        Ok(Err(e)) => {
            tracing::warn!(sender = %message.sender, receiver = %message.receiver, error = %e, "Relaying unsaved message");
            Some(message.into())
        }
        Err(_) => {
            tracing::warn!(
                sender = %message.sender,
                receiver = %message.receiver,
                timeout_ms = state.settings.websocket.persist_timeout_ms,
                "Message store too slow, relaying unsaved message"
            );
            Some(message.into())
        }
    }
}
