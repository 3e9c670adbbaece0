//! WebSocket Session State

use std::time::{Duration, Instant};

use crate::application::relay::ConnectionId;

/// Per-connection bookkeeping kept by the socket task
#[derive(Debug)]
pub struct ConnectionSession {
    pub connection_id: ConnectionId,
    /// Last id the client registered with, for logging only
    pub user_id: Option<String>,
    pub frames_received: u64,
    pub last_seen: Instant,
}

impl ConnectionSession {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            user_id: None,
            frames_received: 0,
            last_seen: Instant::now(),
        }
    }

    /// Note client activity (any frame, including pongs)
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn record_frame(&mut self) {
        self.frames_received += 1;
        self.touch();
    }

    pub fn is_alive(&self, idle_timeout: Duration) -> bool {
        self.last_seen.elapsed() < idle_timeout
    }
}
