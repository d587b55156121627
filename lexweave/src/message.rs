//! Conversation history types for pipeline state.
//!
//! Each message carries an id so history pruning can name the entries to
//! drop. The history channel is the only state channel updated through ops
//! (`MessageOp`) instead of overwrite; see `VerdictState::apply`.

/// Speaker role for a conversation entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Role {
    /// System instruction; typically placed first in the list.
    System,
    /// End-user input.
    User,
    /// Pipeline reply (verdict summaries, history summaries).
    Assistant,
}

/// A single message in the conversation history.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    /// Unique id, referenced by `MessageOp::Remove` during pruning.
    pub id: String,
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// One operation against the history channel.
///
/// Ops in a partial update are applied in order, so a prune-then-append
/// sequence (remove stale entries, push a summary, push the new turn) is a
/// single update.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum MessageOp {
    /// Append a message at the end of the history.
    Push(ChatMessage),
    /// Remove the message with the given id, if present.
    Remove(String),
}
