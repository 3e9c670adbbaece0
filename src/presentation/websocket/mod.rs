//! WebSocket Transport
//!
//! Per-connection socket tasks feeding the relay.

pub mod handler;
pub mod session;

pub use handler::ws_handler;
pub use session::ConnectionSession;
