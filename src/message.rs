use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single chat message. Immutable once created; edits and retries are
/// expressed by appending new messages, never by rewriting old ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Verbatim message content. May contain markdown; surrounding
    /// whitespace is preserved as typed.
    pub text: String,
    /// True for end-user messages, false for assistant replies.
    pub is_user: bool,
    /// Creation time in UTC. Display formatting is a presentation concern.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a user-authored message stamped with the current time.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant-authored message stamped with the current time.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
            timestamp: Utc::now(),
        }
    }
}
