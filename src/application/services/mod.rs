//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **MessageService**: Message send, conversation reads and soft deletion
//! - **CallService**: Call history lookups

pub mod call_service;
pub mod message_service;

// Re-export message service types
pub use message_service::{MessageError, MessageService, MessageServiceImpl, NewMessageDto};

// Re-export call service types
pub use call_service::{CallError, CallService, CallServiceImpl};
