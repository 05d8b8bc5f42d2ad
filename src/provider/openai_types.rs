//! OpenAI-compatible chat completion types
//!
//! Shared by OpenAI, DeepSeek and Grok, which all accept the same
//! `/chat/completions` request and answer with `choices[0]`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat completion request
#[derive(Serialize, Debug)]
pub struct ChatCompletionRequest {
    /// Model identifier
    pub model: String,
    /// Conversation including the system turn
    pub messages: Vec<ChatCompletionMessage>,
    /// Sampling temperature
    pub temperature: f32,
    /// Ask for a delta stream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Declared tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    /// Output token cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// One request message
#[derive(Serialize, Debug)]
pub struct ChatCompletionMessage {
    /// "system", "user" or "assistant"
    pub role: String,
    /// Message text
    pub content: String,
}

/// A declared tool
#[derive(Serialize, Debug)]
pub struct ToolDefinition {
    /// Always "function"
    #[serde(rename = "type")]
    pub kind: String,
    /// Function declaration
    pub function: FunctionDefinition,
}

/// A declared function
#[derive(Serialize, Debug)]
pub struct FunctionDefinition {
    /// Function name
    pub name: String,
    /// What it does
    pub description: String,
    /// Arguments schema
    pub parameters: Value,
}

/// One streamed delta chunk
#[derive(Deserialize, Debug, Default)]
pub struct ChatCompletionChunk {
    /// Choices; only the first is used
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    /// `choices[0].delta.content`, if present
    pub fn delta_content(self) -> Option<String> {
        self.choices.into_iter().next()?.delta?.content
    }
}

/// Choice inside a streamed chunk
#[derive(Deserialize, Debug)]
pub struct ChunkChoice {
    /// Incremental content
    #[serde(default)]
    pub delta: Option<Delta>,
}

/// Incremental content
#[derive(Deserialize, Debug)]
pub struct Delta {
    /// Text piece
    #[serde(default)]
    pub content: Option<String>,
}

/// Non-streamed chat completion response
#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    /// Choices; only the first is used
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// A completed choice
#[derive(Deserialize, Debug)]
pub struct Choice {
    /// The assistant message
    pub message: ResponseMessage,
}

/// Assistant message of a completed choice
#[derive(Deserialize, Debug)]
pub struct ResponseMessage {
    /// Reply text
    #[serde(default)]
    pub content: Option<String>,
    /// Requested tool calls
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// A requested tool call
#[derive(Deserialize, Debug)]
pub struct ToolCall {
    /// Call id
    #[serde(default)]
    pub id: Option<String>,
    /// Function and encoded arguments
    pub function: FunctionCall,
}

/// Function part of a tool call
#[derive(Deserialize, Debug)]
pub struct FunctionCall {
    /// Declared function name
    pub name: String,
    /// Arguments as a JSON-encoded string
    #[serde(default)]
    pub arguments: String,
}
