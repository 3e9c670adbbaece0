//! Conversation participant pair.

use serde::{Deserialize, Serialize};

/// Unordered pair of user ids identifying a one-to-one conversation.
///
/// `Conversation::new("a", "b") == Conversation::new("b", "a")`; queries
/// built from it match messages sent in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conversation {
    low: String,
    high: String,
}

impl Conversation {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Both participants, lexicographically ordered.
    pub fn participants(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }

    pub fn includes(&self, user_id: &str) -> bool {
        self.low == user_id || self.high == user_id
    }

    /// Whether a message from `sender` to `receiver` belongs to this conversation.
    pub fn matches(&self, sender: &str, receiver: &str) -> bool {
        *self == Conversation::new(sender, receiver)
    }
}
