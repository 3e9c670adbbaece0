//! Value Objects

mod conversation;

pub use conversation::Conversation;
