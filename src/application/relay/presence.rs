//! Presence registry: which user is online, and on which connection.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::ServerEvent;

/// Identifier of one live socket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sending side of a live connection.
///
/// The transport owns the receiving end; once it is dropped every send is a
/// silent no-op. Two handles are equal when they refer to the same connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self { id, sender }
    }

    /// Create a handle together with its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(ConnectionId::new(), tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Push an event; returns false if the connection is already gone.
    pub fn send(&self, event: ServerEvent) -> bool {
        let name = event.name();
        let delivered = self.sender.send(event).is_ok();
        if !delivered {
            tracing::debug!(connection_id = %self.id, event = name, "Connection closed, event dropped");
        }
        delivered
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

/// Maps user ids to their current connection.
///
/// At most one connection per user; the last registration wins. A connection
/// carries at most one identity.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    by_user: HashMap<String, ConnectionHandle>,
    by_connection: HashMap<ConnectionId, String>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `user_id` to `handle`, replacing any earlier binding of either.
    ///
    /// A replaced connection is not closed; it simply stops being reachable.
    /// Returns the replaced connection's id, if any.
    pub fn register(&mut self, user_id: &str, handle: ConnectionHandle) -> Option<ConnectionId> {
        if let Some(previous_user) = self.by_connection.remove(&handle.id()) {
            if previous_user != user_id {
                self.by_user.remove(&previous_user);
            }
        }

        let replaced = self
            .by_user
            .insert(user_id.to_string(), handle.clone())
            .filter(|old| *old != handle)
            .map(|old| old.id());

        if let Some(old_id) = replaced {
            self.by_connection.remove(&old_id);
        }
        self.by_connection.insert(handle.id(), user_id.to_string());
        replaced
    }

    pub fn lookup(&self, user_id: &str) -> Option<&ConnectionHandle> {
        self.by_user.get(user_id)
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        self.by_user.contains_key(user_id)
    }

    /// User currently registered on `connection`, if it is still the live one.
    pub fn owner_of(&self, connection: ConnectionId) -> Option<&str> {
        self.by_connection.get(&connection).map(String::as_str)
    }

    /// Remove the entry bound to `handle`.
    ///
    /// Does nothing when the user has since registered on a newer connection.
    /// Returns the user that went offline.
    pub fn unregister(&mut self, handle: &ConnectionHandle) -> Option<String> {
        let user_id = self.by_connection.remove(&handle.id())?;
        match self.by_user.get(&user_id) {
            Some(current) if current == handle => {
                self.by_user.remove(&user_id);
                Some(user_id)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_user.is_empty()
    }
}
