//! # Domain Entities
//!
//! Persistent business objects of the chat-and-call backend.
//!
//! - **ChatMessage**: a one-to-one text message with per-participant soft deletion
//! - **CallRecord**: durable history of a call between two users
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer.

mod call;
mod message;

pub use call::{CallRecord, CallRecordStatus, CallRepository};
pub use message::{ChatMessage, DeliveryStatus, MessageRepository};

#[cfg(test)]
pub use call::MockCallRepository;
#[cfg(test)]
pub use message::MockMessageRepository;
