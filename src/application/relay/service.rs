//! Relay Service
//!
//! The presence registry and call session table, plus the state machine that
//! moves calls between them:
//!
//! ```text
//!   NONE ──initiateCall──► RINGING ──acceptCall──► ONGOING
//!    ▲                        │                       │
//!    └──rejectCall / endCall / disconnect─────────────┘
//! ```
//!
//! All state is owned by one `RelayService` and mutated only from its event
//! loop, one command at a time, so the tables need no locking.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::call_sessions::{CallSessionTable, CallStatus, EndedCall};
use super::error::RelayError;
use super::events::{
    CallFailureReason, CallOffer, CallParties, ClientEvent, RelayedMessage, ServerEvent, SignalRequest,
};
use super::presence::{ConnectionHandle, PresenceRegistry};
use super::recorder::CallRecorder;
use super::signal::{self, SignalKind};
use crate::domain::CallRecordStatus;
use crate::infrastructure::metrics;

/// Work item for the relay event loop.
#[derive(Debug)]
pub enum RelayCommand {
    /// An event received on a client connection
    Inbound {
        connection: ConnectionHandle,
        event: ClientEvent,
    },
    /// Push a chat message to its participants; `origin` gets the echo when set
    Deliver {
        message: RelayedMessage,
        origin: Option<ConnectionHandle>,
    },
    /// The transport closed a connection
    Disconnect { connection: ConnectionHandle },
    Stats { reply: oneshot::Sender<RelayStats> },
}

/// Point-in-time relay counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    pub online_users: usize,
    pub active_calls: usize,
}

/// Presence, call sessions and the signaling state machine.
pub struct RelayService {
    presence: PresenceRegistry,
    sessions: CallSessionTable,
    recorder: CallRecorder,
}

impl RelayService {
    pub fn new(recorder: CallRecorder) -> Self {
        Self {
            presence: PresenceRegistry::new(),
            sessions: CallSessionTable::new(),
            recorder,
        }
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn sessions(&self) -> &CallSessionTable {
        &self.sessions
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            online_users: self.presence.len(),
            active_calls: self.sessions.active_calls(),
        }
    }

    /// Drain commands until every sender is gone.
    pub async fn run(mut self, mut commands: mpsc::Receiver<RelayCommand>) {
        tracing::info!("Relay event loop starting");

        while let Some(command) = commands.recv().await {
            self.dispatch(command);
        }

        tracing::info!("Relay command channel closed, event loop stopped");
    }

    /// Handle one command to completion.
    pub fn dispatch(&mut self, command: RelayCommand) {
        match command {
            RelayCommand::Inbound { connection, event } => self.handle_event(&connection, event),
            RelayCommand::Deliver { message, origin } => {
                self.relay_message(message, origin.as_ref());
                metrics::record_relay_event("deliverMessage", "ok");
            }
            RelayCommand::Disconnect { connection } => {
                self.disconnect(&connection);
                metrics::record_relay_event("disconnect", "ok");
            }
            RelayCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }

        metrics::set_relay_state(self.presence.len(), self.sessions.active_calls());
    }

    /// Route an inbound client event to its handler and report the outcome.
    pub fn handle_event(&mut self, connection: &ConnectionHandle, event: ClientEvent) {
        let name = event.name();

        let result = match event {
            ClientEvent::RegisterUser(user_id) => self.register_user(connection, &user_id),
            // The socket transport stores messages and sends them through
            // `Deliver`; a raw event is relayed as-is, without an id.
            ClientEvent::SendMessage(message) => {
                self.relay_message(message.into(), Some(connection));
                Ok(())
            }
            ClientEvent::InitiateCall(offer) => self.initiate_call(offer),
            ClientEvent::AcceptCall(answer) => self.accept_call(answer),
            ClientEvent::RejectCall(parties) => self.reject_call(parties),
            ClientEvent::EndCall(parties) => self.end_call(connection, parties),
            ClientEvent::Signal(request) => self.signal(connection, request),
        };

        let outcome = match &result {
            Ok(()) => "ok",
            Err(e) => e.kind(),
        };
        metrics::record_relay_event(name, outcome);

        if let Err(error) = result {
            self.report(connection, name, error);
        }
    }

    /// Turn a failed operation into at most one notification to its initiator.
    fn report(&self, connection: &ConnectionHandle, event: &'static str, error: RelayError) {
        match error {
            RelayError::TargetOffline(receiver_id) => {
                tracing::debug!(connection_id = %connection.id(), event, receiver_id = %receiver_id, "Target offline");
                connection.send(ServerEvent::CallFailed {
                    receiver_id,
                    reason: CallFailureReason::Offline,
                });
            }
            RelayError::PeerBusy(receiver_id) => {
                tracing::debug!(connection_id = %connection.id(), event, receiver_id = %receiver_id, "Target busy");
                connection.send(ServerEvent::CallFailed {
                    receiver_id,
                    reason: CallFailureReason::Busy,
                });
            }
            RelayError::MalformedSignal(shape) => {
                tracing::warn!(connection_id = %connection.id(), event, shape, "Dropped malformed signal payload");
            }
            RelayError::InvalidRequest(reason) => {
                tracing::debug!(connection_id = %connection.id(), event, reason, "Dropped invalid request");
            }
            RelayError::NotRunning => {
                tracing::error!(connection_id = %connection.id(), event, "Relay reported itself as not running");
            }
        }
    }

    fn register_user(&mut self, connection: &ConnectionHandle, user_id: &str) -> Result<(), RelayError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(RelayError::InvalidRequest("empty user id"));
        }

        // The connection leaves its previous identity; that identity goes offline.
        if let Some(previous) = self.presence.owner_of(connection.id()).map(str::to_owned) {
            if previous != user_id {
                self.end_call_of(&previous);
                tracing::info!(
                    previous_user_id = %previous,
                    user_id,
                    connection_id = %connection.id(),
                    "Connection moved to another identity"
                );
            }
        }

        if let Some(stale) = self.presence.register(user_id, connection.clone()) {
            tracing::info!(
                user_id,
                connection_id = %connection.id(),
                stale_connection_id = %stale,
                "User re-registered, previous connection no longer reachable"
            );
        } else {
            tracing::info!(user_id, connection_id = %connection.id(), "User registered");
        }
        Ok(())
    }

    fn initiate_call(&mut self, offer: CallOffer) -> Result<(), RelayError> {
        let CallOffer {
            caller_id,
            receiver_id,
            signal_data,
        } = offer;
        check_parties(&caller_id, &receiver_id)?;

        if SignalKind::classify(&signal_data) != Some(SignalKind::Offer) {
            return Err(RelayError::MalformedSignal(signal::describe(&signal_data)));
        }

        let receiver = self
            .presence
            .lookup(&receiver_id)
            .cloned()
            .ok_or_else(|| RelayError::TargetOffline(receiver_id.clone()))?;

        if self.sessions.is_in_call(&receiver_id) {
            return Err(RelayError::PeerBusy(receiver_id));
        }
        if self.sessions.is_in_call(&caller_id) {
            return Err(RelayError::InvalidRequest("caller already in a call"));
        }

        let call_id = Uuid::now_v7();
        self.sessions
            .create_pair(&caller_id, &receiver_id, CallStatus::Ringing, call_id);
        self.recorder.started(call_id, &caller_id, &receiver_id);

        tracing::info!(
            call_id = %call_id,
            caller_id = %caller_id,
            receiver_id = %receiver_id,
            "Call ringing"
        );

        receiver.send(ServerEvent::IncomingCall {
            caller_id,
            signal_data,
        });
        Ok(())
    }

    fn accept_call(&mut self, answer: CallOffer) -> Result<(), RelayError> {
        let CallOffer {
            caller_id,
            receiver_id,
            signal_data,
        } = answer;
        check_parties(&caller_id, &receiver_id)?;

        if SignalKind::classify(&signal_data) != Some(SignalKind::Answer) {
            return Err(RelayError::MalformedSignal(signal::describe(&signal_data)));
        }

        let caller = self
            .presence
            .lookup(&caller_id)
            .cloned()
            .ok_or_else(|| RelayError::TargetOffline(caller_id.clone()))?;

        let ringing = self.sessions.are_paired(&receiver_id, &caller_id)
            && self.sessions.get(&receiver_id).map(|s| s.status) == Some(CallStatus::Ringing);

        if ringing {
            if let Some(call_id) = self.sessions.update_status(&receiver_id, CallStatus::Ongoing) {
                self.recorder.answered(call_id);
                tracing::info!(
                    call_id = %call_id,
                    caller_id = %caller_id,
                    receiver_id = %receiver_id,
                    "Call answered"
                );
            }
        } else {
            tracing::debug!(
                caller_id = %caller_id,
                receiver_id = %receiver_id,
                "Answer without a ringing session, forwarding anyway"
            );
        }

        caller.send(ServerEvent::CallAccepted { signal_data });
        Ok(())
    }

    fn reject_call(&mut self, parties: CallParties) -> Result<(), RelayError> {
        let CallParties {
            caller_id,
            receiver_id,
        } = parties;

        if self.sessions.are_paired(&caller_id, &receiver_id) {
            if let Some(ended) = self.sessions.remove_pair(&caller_id) {
                self.recorder.finished(ended.call_id, CallRecordStatus::Rejected);
                tracing::info!(call_id = %ended.call_id, caller_id = %caller_id, receiver_id = %receiver_id, "Call rejected");
            }
        }

        if let Some(caller) = self.presence.lookup(&caller_id) {
            caller.send(ServerEvent::CallRejected { receiver_id });
        }
        Ok(())
    }

    fn end_call(&mut self, connection: &ConnectionHandle, parties: CallParties) -> Result<(), RelayError> {
        let CallParties {
            caller_id,
            receiver_id,
        } = parties;

        if self.sessions.are_paired(&caller_id, &receiver_id) {
            if let Some(ended) = self.sessions.remove_pair(&caller_id) {
                self.finish(&ended);
            }
        }

        // Notify whichever side did not send the event; both if the sender is neither.
        let sender = self.presence.owner_of(connection.id());
        let targets: Vec<(&str, &str)> = match sender {
            Some(s) if s == caller_id => vec![(receiver_id.as_str(), caller_id.as_str())],
            Some(s) if s == receiver_id => vec![(caller_id.as_str(), receiver_id.as_str())],
            _ => vec![
                (receiver_id.as_str(), caller_id.as_str()),
                (caller_id.as_str(), receiver_id.as_str()),
            ],
        };

        for (target, other) in targets {
            if let Some(peer) = self.presence.lookup(target) {
                if peer != connection {
                    peer.send(ServerEvent::CallEnded {
                        user_id: other.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn signal(&mut self, connection: &ConnectionHandle, request: SignalRequest) -> Result<(), RelayError> {
        let SignalRequest { user_id, signal } = request;

        let kind = SignalKind::classify(&signal)
            .ok_or_else(|| RelayError::MalformedSignal(signal::describe(&signal)))?;

        let target = self
            .presence
            .lookup(&user_id)
            .ok_or_else(|| RelayError::TargetOffline(user_id.clone()))?;

        let from = self.presence.owner_of(connection.id()).map(str::to_owned);
        tracing::trace!(target_user = %user_id, kind = kind.as_str(), "Relaying signal");

        target.send(ServerEvent::Signal {
            user_id: from,
            signal,
        });
        Ok(())
    }

    /// Best-effort delivery to the receiver plus an echo to the sender side.
    fn relay_message(&self, message: RelayedMessage, origin: Option<&ConnectionHandle>) {
        let recipient = self.presence.lookup(&message.receiver);

        match recipient {
            Some(conn) => {
                conn.send(ServerEvent::ReceiveMessage(message.clone()));
            }
            None => tracing::debug!(receiver = %message.receiver, "Recipient offline, message left in store"),
        }

        let echo = origin.or_else(|| self.presence.lookup(&message.sender));
        if let Some(echo) = echo {
            if Some(echo) != recipient {
                echo.send(ServerEvent::ReceiveMessage(message));
            }
        }
    }

    /// Tear down after a connection closed.
    ///
    /// Reads the session and the peer's presence before the registry entry
    /// is erased. A connection that was superseded by a newer registration
    /// leaves the user's call alone.
    fn disconnect(&mut self, connection: &ConnectionHandle) {
        let Some(user_id) = self.presence.owner_of(connection.id()).map(str::to_owned) else {
            tracing::debug!(connection_id = %connection.id(), "Unregistered or superseded connection closed");
            return;
        };

        self.end_call_of(&user_id);
        self.presence.unregister(connection);
        tracing::info!(user_id = %user_id, connection_id = %connection.id(), "User went offline");
    }

    /// Remove `user_id`'s call, if any, and tell the surviving peer.
    fn end_call_of(&mut self, user_id: &str) {
        if let Some(ended) = self.sessions.remove_pair(user_id) {
            self.finish(&ended);
            if let Some(peer) = self.presence.lookup(&ended.peer_id) {
                peer.send(ServerEvent::CallEnded {
                    user_id: user_id.to_string(),
                });
            }
        }
    }

    fn finish(&self, ended: &EndedCall) {
        let status = match ended.status {
            CallStatus::Ringing => CallRecordStatus::Missed,
            CallStatus::Ongoing => CallRecordStatus::Completed,
        };
        self.recorder.finished(ended.call_id, status);
        tracing::info!(
            call_id = %ended.call_id,
            user_id = %ended.user_id,
            peer_id = %ended.peer_id,
            outcome = status.as_str(),
            "Call ended"
        );
    }
}

fn check_parties(caller_id: &str, receiver_id: &str) -> Result<(), RelayError> {
    if caller_id.trim().is_empty() || receiver_id.trim().is_empty() {
        return Err(RelayError::InvalidRequest("missing call party"));
    }
    if caller_id == receiver_id {
        return Err(RelayError::InvalidRequest("caller and receiver are the same user"));
    }
    Ok(())
}
