//! Conversation history shared by every extraction in a session
//!
//! The history is kept in one normalized form; model backends transcode it into
//! their own message format at call time.

use std::fmt;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only sequence of turns
///
/// Turns are only ever committed as a user/assistant exchange, so the history
/// always alternates and always has an even length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Commits a completed exchange
    pub fn push_exchange(&mut self, user: Turn, assistant: Turn) {
        debug_assert_eq!(user.role, Role::User);
        debug_assert_eq!(assistant.role, Role::Assistant);
        self.turns.push(user);
        self.turns.push(assistant);
    }

    /// The turns a model call sees: the whole history plus one pending user turn
    ///
    /// The pending turn is not committed; it only becomes part of the history
    /// through [`push_exchange`](Self::push_exchange).
    pub fn with_pending(&self, pending: &Turn) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(self.turns.len() + 1);
        turns.extend_from_slice(&self.turns);
        turns.push(pending.clone());
        turns
    }
}
