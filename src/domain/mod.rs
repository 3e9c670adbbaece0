//! # Domain Layer
//!
//! Entities, value objects and repository contracts of the chat-and-call backend.
//! It has no dependency on infrastructure or presentation code.
//!
//! ## Structure
//!
//! - **entities**: ChatMessage, CallRecord and their repository traits
//! - **value_objects**: Conversation participant pairs

pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use value_objects::*;
