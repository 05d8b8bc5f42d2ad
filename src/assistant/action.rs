//! Decoded assistant actions

use crate::assistant::tools::{ADD_GLOSSARY_TOOL, REMOVE_GLOSSARY_TOOL};
use crate::error::AppError;
use crate::provider::ToolInvocation;
use serde_json::Value;

/// Message shown while glossary entries are being saved
pub const ADD_GLOSSARY_MESSAGE: &str = "Got it! Processing glossary...";

/// Message stored as the seed of a cleared transcript
pub const CLEAR_CHAT_MESSAGE: &str = "Done! Chat memory has been cleared.";

/// Reply used when the model answered with no text at all
pub const EMPTY_REPLY: &str = "...";

/// What the assistant asked the application to do
///
/// Every variant carries the message shown to the author.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantAction {
    /// Save glossary entries; `raw` is the tool arguments exactly as sent
    AddGlossary {
        /// Undecoded tool arguments
        raw: Value,
        /// User-facing message
        message: String,
    },
    /// Remove glossary entries by original term
    RemoveGlossary {
        /// Original terms to remove
        originals: Vec<String>,
        /// User-facing message
        message: String,
    },
    /// Reset the transcript
    ClearChat {
        /// User-facing message, kept as the new seed
        message: String,
    },
    /// Load a saved translation into the assistant's memory
    ReadSavedTranslation {
        /// Name (or part of the name) of the saved translation
        name: String,
        /// User-facing message
        message: String,
    },
    /// Plain reply, no state change
    None {
        /// Reply text
        message: String,
    },
}

impl AssistantAction {
    /// The user-facing message of any variant
    pub fn message(&self) -> &str {
        match self {
            AssistantAction::AddGlossary { message, .. }
            | AssistantAction::RemoveGlossary { message, .. }
            | AssistantAction::ClearChat { message }
            | AssistantAction::ReadSavedTranslation { message, .. }
            | AssistantAction::None { message } => message,
        }
    }

    /// Transcript reset with the standard message
    pub fn clear_chat() -> Self {
        AssistantAction::ClearChat {
            message: CLEAR_CHAT_MESSAGE.to_string(),
        }
    }

    /// Request to read a saved translation by name
    pub fn read_saved_translation(name: &str) -> Self {
        let name = name.trim().to_string();
        AssistantAction::ReadSavedTranslation {
            message: format!("Reading \"{}\"...", name),
            name,
        }
    }

    /// Plain reply; empty text becomes a placeholder
    pub fn reply(text: &str) -> Self {
        let message = if text.trim().is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            text.to_string()
        };
        AssistantAction::None { message }
    }

    /// Decode a provider tool call
    ///
    /// # Errors
    /// * `AppError::ActionDecode` for an unknown tool name or removal
    ///   arguments that are not a list of strings
    pub fn from_tool_call(call: &ToolInvocation) -> Result<Self, AppError> {
        match call.name.as_str() {
            ADD_GLOSSARY_TOOL => Ok(AssistantAction::AddGlossary {
                raw: call.arguments.clone(),
                message: ADD_GLOSSARY_MESSAGE.to_string(),
            }),
            REMOVE_GLOSSARY_TOOL => {
                let originals = decode_originals(&call.arguments)?;
                Ok(AssistantAction::RemoveGlossary {
                    message: format!("Removing {} item(s)...", originals.len()),
                    originals,
                })
            }
            other => Err(AppError::ActionDecode(format!("unknown tool '{}'", other))),
        }
    }
}

/// `{"originals": [...]}`, a bare array, or a single string
fn decode_originals(arguments: &Value) -> Result<Vec<String>, AppError> {
    let list = match arguments {
        Value::Object(map) => map.get("originals").ok_or_else(|| {
            AppError::ActionDecode("remove_from_glossary is missing 'originals'".to_string())
        })?,
        other => other,
    };

    match list {
        Value::String(term) => Ok(vec![term.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    AppError::ActionDecode(format!("expected a term string, got {}", item))
                })
            })
            .collect(),
        other => Err(AppError::ActionDecode(format!(
            "expected a list of terms, got {}",
            other
        ))),
    }
}
