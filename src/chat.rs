//! Assistant chat history
//!
//! The transcript is append-only. The only way to drop messages is a
//! wholesale reset, which leaves either nothing or a single seed message.

use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Message from the author
    User,
    /// Message from the assistant
    Model,
}

impl ChatRole {
    /// Convert the role to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

impl From<&str> for ChatRole {
    fn from(s: &str) -> Self {
        match s {
            "model" | "assistant" => ChatRole::Model,
            _ => ChatRole::User,
        }
    }
}

/// A single message in the assistant transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Who sent the message
    pub role: ChatRole,
    /// Message body
    pub text: String,
    /// Hidden messages reach the model but are never shown in the transcript
    #[serde(default)]
    pub is_hidden: bool,
}

impl ChatMessage {
    /// Visible message from the author
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            is_hidden: false,
        }
    }

    /// Visible message from the assistant
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
            is_hidden: false,
        }
    }

    /// Hidden author-side message carrying out-of-band context
    pub fn memory_injection(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            is_hidden: true,
        }
    }
}

/// The last `window` non-hidden messages of `messages`, oldest first
pub fn visible_tail(messages: &[ChatMessage], window: usize) -> Vec<&ChatMessage> {
    let visible: Vec<&ChatMessage> = messages.iter().filter(|m| !m.is_hidden).collect();
    let start = visible.len().saturating_sub(window);
    visible[start..].to_vec()
}

/// Ordered assistant transcript
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    /// Empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// History holding a single seed message
    pub fn seeded(seed: ChatMessage) -> Self {
        Self {
            messages: vec![seed],
        }
    }

    /// All messages, hidden ones included
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages the transcript should display
    pub fn visible(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| !m.is_hidden)
    }

    /// The last `window` visible messages, oldest first
    pub fn visible_tail(&self, window: usize) -> Vec<&ChatMessage> {
        visible_tail(&self.messages, window)
    }

    /// Number of messages, hidden ones included
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Replace the whole history with nothing or a single seed message
    pub fn reset(&mut self, seed: Option<ChatMessage>) {
        self.messages = seed.into_iter().collect();
    }
}
