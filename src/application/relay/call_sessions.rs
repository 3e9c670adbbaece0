//! Call session table: which users are in a call, with whom, and in what state.

use std::collections::HashMap;

use uuid::Uuid;

/// Live state of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Ringing,
    Ongoing,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ringing => "ringing",
            Self::Ongoing => "ongoing",
        }
    }
}

/// One side of a session pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSession {
    pub peer_id: String,
    pub status: CallStatus,
    /// Shared by both entries of the pair; keys the persisted call record
    pub call_id: Uuid,
}

/// A session pair removed from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndedCall {
    pub user_id: String,
    pub peer_id: String,
    pub status: CallStatus,
    pub call_id: Uuid,
}

/// Session pairs keyed by participant.
///
/// Entries always come in mirrored pairs: if `a -> (b, s)` exists then
/// `b -> (a, s)` exists too. Users not in a call have no entry.
#[derive(Debug, Default)]
pub struct CallSessionTable {
    sessions: HashMap<String, CallSession>,
}

impl CallSessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install both directional entries with the same status and call id.
    ///
    /// Callers check that neither user already has a session.
    pub fn create_pair(&mut self, caller_id: &str, receiver_id: &str, status: CallStatus, call_id: Uuid) {
        debug_assert!(caller_id != receiver_id);
        self.sessions.insert(
            caller_id.to_string(),
            CallSession {
                peer_id: receiver_id.to_string(),
                status,
                call_id,
            },
        );
        self.sessions.insert(
            receiver_id.to_string(),
            CallSession {
                peer_id: caller_id.to_string(),
                status,
                call_id,
            },
        );
    }

    /// Set the status on both entries of the pair containing `user_id`.
    ///
    /// Returns the pair's call id, or `None` (no-op) if the user is not in a call.
    pub fn update_status(&mut self, user_id: &str, status: CallStatus) -> Option<Uuid> {
        let session = self.sessions.get_mut(user_id)?;
        session.status = status;
        let (peer_id, call_id) = (session.peer_id.clone(), session.call_id);
        if let Some(peer) = self.sessions.get_mut(&peer_id) {
            peer.status = status;
        }
        Some(call_id)
    }

    pub fn get_peer(&self, user_id: &str) -> Option<&str> {
        self.sessions.get(user_id).map(|s| s.peer_id.as_str())
    }

    pub fn get(&self, user_id: &str) -> Option<&CallSession> {
        self.sessions.get(user_id)
    }

    pub fn is_in_call(&self, user_id: &str) -> bool {
        self.sessions.contains_key(user_id)
    }

    /// Whether `a` and `b` are the two sides of one pair.
    pub fn are_paired(&self, a: &str, b: &str) -> bool {
        self.get_peer(a) == Some(b)
    }

    /// Delete the entry for `user_id` and the entry of its recorded peer.
    ///
    /// No-op returning `None` if the user has no session.
    pub fn remove_pair(&mut self, user_id: &str) -> Option<EndedCall> {
        let session = self.sessions.remove(user_id)?;
        self.sessions.remove(&session.peer_id);
        Some(EndedCall {
            user_id: user_id.to_string(),
            peer_id: session.peer_id,
            status: session.status,
            call_id: session.call_id,
        })
    }

    /// Number of active pairs.
    pub fn active_calls(&self) -> usize {
        self.sessions.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
