//! Real-time relay: presence, call sessions, signaling and live message
//! delivery, driven by a single event loop.

mod call_sessions;
mod error;
mod events;
mod handle;
mod presence;
mod recorder;
mod service;
mod signal;

pub use call_sessions::{CallSession, CallSessionTable, CallStatus, EndedCall};
pub use error::RelayError;
pub use events::{
    CallFailureReason, CallOffer, CallParties, ClientEvent, OutgoingMessage, RelayedMessage, ServerEvent,
    SignalRequest,
};
pub use handle::RelayHandle;
pub use presence::{ConnectionHandle, ConnectionId, PresenceRegistry};
pub use recorder::{CallLogEntry, CallRecorder};
pub use service::{RelayCommand, RelayService, RelayStats};
pub use signal::SignalKind;
