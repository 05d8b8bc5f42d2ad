//! Canonical request and response shapes shared by every provider

use crate::chat::ChatRole;
use crate::error::AppError;
use futures_util::stream::Stream;
use serde_json::Value;
use std::pin::Pin;

/// Ordered stream of events from a streaming completion
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, AppError>> + Send>>;

/// One item of a streaming completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Next piece of reply text, possibly empty
    Fragment(String),
    /// Provider's guess at the source language
    DetectedLanguage(String),
}

/// One conversational turn sent to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    /// Speaker
    pub role: ChatRole,
    /// Turn text
    pub content: String,
}

impl PromptMessage {
    /// Author turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Assistant turn
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
        }
    }
}

/// Streaming completion request
#[derive(Debug, Clone)]
pub struct TextRequest {
    /// System instruction
    pub system: String,
    /// Conversation, oldest first
    pub messages: Vec<PromptMessage>,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling cutoff, where the provider supports it
    pub top_p: Option<f32>,
}

/// Tool-enabled completion request
#[derive(Debug, Clone)]
pub struct ToolRequest {
    /// System instruction
    pub system: String,
    /// Conversation, oldest first
    pub messages: Vec<PromptMessage>,
    /// Functions the model may call
    pub tools: Vec<ToolSchema>,
    /// Sampling temperature
    pub temperature: f32,
    /// Output token cap
    pub max_output_tokens: u32,
}

/// Declaration of a function the model may invoke
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSchema {
    /// Function name
    pub name: String,
    /// What the function does, for the model
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

/// A function invocation returned by the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Function name
    pub name: String,
    /// Decoded arguments, exactly as sent by the model
    ///
    /// Calls after the first that fail to decode keep their raw argument
    /// string as a JSON string value.
    pub arguments: Value,
}

/// Reply to a tool-enabled completion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderReply {
    /// Reply text; empty when the model only called a tool
    pub text: String,
    /// Function invocations in the order the model emitted them
    pub tool_calls: Vec<ToolInvocation>,
}
