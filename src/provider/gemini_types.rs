//! Gemini API request and response types
//!
//! Structs that mirror the Gemini `generateContent` /
//! `streamGenerateContent` JSON format. Response fields are lenient: a
//! streamed chunk may omit candidates, content or text entirely.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level Gemini API response (also one streamed chunk)
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiApiResponse {
    /// Candidate responses from the model
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Feedback about the prompt (e.g., if it was blocked)
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GeminiApiResponse {
    /// Concatenated text of the first candidate; empty when absent
    pub fn text(&self) -> String {
        self.parts()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .concat()
    }

    /// Function calls of the first candidate, in order
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.parts().filter_map(|p| p.function_call.as_ref()).collect()
    }

    /// Block reason, if the prompt was rejected
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }

    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
            .iter()
    }
}

/// A single candidate response from the model
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The content of this candidate
    #[serde(default)]
    pub content: Option<Content>,
    /// Why the model stopped generating (if applicable)
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Content structure containing parts of the response
#[derive(Deserialize, Debug)]
pub struct Content {
    /// Content parts
    #[serde(default)]
    pub parts: Vec<Part>,
    /// Role of the content (e.g., "model")
    #[serde(default)]
    pub role: Option<String>,
}

/// A single part of content
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Text, if this is a text part
    #[serde(default)]
    pub text: Option<String>,
    /// Function invocation, if this is a call part
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
}

/// A function invocation chosen by the model
#[derive(Deserialize, Debug, Clone)]
pub struct FunctionCall {
    /// Declared function name
    pub name: String,
    /// Arguments object
    #[serde(default)]
    pub args: Value,
}

/// Feedback about the prompt (e.g., if it was blocked)
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was blocked (if applicable)
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Request structure for Gemini API
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GeminiApiRequest {
    /// Conversation turns
    pub contents: Vec<RequestContent>,
    /// System instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    /// Declared tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<GeminiTool>>,
    /// Sampling configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// One conversation turn
#[derive(Serialize, Debug)]
pub struct RequestContent {
    /// "user" or "model"
    pub role: String,
    /// Turn parts
    pub parts: Vec<RequestPart>,
}

/// A text part for requests
#[derive(Serialize, Debug)]
pub struct RequestPart {
    /// The text content
    pub text: String,
}

/// System instruction wrapper
#[derive(Serialize, Debug)]
pub struct SystemInstruction {
    /// Instruction parts
    pub parts: Vec<RequestPart>,
}

/// Tool group
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GeminiTool {
    /// Declared functions
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// A declared function
#[derive(Serialize, Debug)]
pub struct FunctionDeclaration {
    /// Function name
    pub name: String,
    /// What it does
    pub description: String,
    /// Arguments schema
    pub parameters: Value,
}

/// Generation configuration for requests
#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Output token cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_without_text_is_empty() {
        let chunk: GeminiApiResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"role":"model","parts":[{}]}}]}"#)
                .unwrap();
        assert_eq!(chunk.text(), "");
        let bare: GeminiApiResponse = serde_json::from_str(r#"{"usageMetadata":{}}"#).unwrap();
        assert_eq!(bare.text(), "");
    }

    #[test]
    fn test_text_and_function_calls() {
        let json = r#"{"candidates":[{"content":{"parts":[
            {"text":"Saving "},
            {"text":"now"},
            {"functionCall":{"name":"add_to_glossary","args":{"items":[]}}}
        ]}}]}"#;
        let response: GeminiApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), "Saving now");
        assert_eq!(response.function_calls()[0].name, "add_to_glossary");
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GeminiApiRequest {
            contents: vec![RequestContent {
                role: "user".to_string(),
                parts: vec![RequestPart {
                    text: "hi".to_string(),
                }],
            }],
            system_instruction: None,
            tools: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(0.3),
                top_p: None,
                max_output_tokens: Some(2000),
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2000);
        assert!(json.get("systemInstruction").is_none());
        assert!(json["generationConfig"].get("topP").is_none());
    }
}
