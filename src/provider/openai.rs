//! OpenAI-compatible chat completions client
//!
//! HTTP delta stream family. The response body is a sequence of lines;
//! `data: <json>` lines carry `choices[0].delta.content` and `data: [DONE]`
//! ends the stream. Lines that fail to parse are skipped, since providers
//! interleave keep-alives and comments with real payloads.

use crate::chat::ChatRole;
use crate::error::AppError;
use crate::provider::http;
use crate::provider::openai_types::{
    ChatCompletionChunk, ChatCompletionMessage, ChatCompletionRequest, ChatCompletionResponse,
    FunctionDefinition, ToolDefinition,
};
use crate::provider::sse::{classify_line, DataLine, LineDecoder};
use crate::provider::types::{
    FragmentStream, PromptMessage, ProviderReply, StreamEvent, TextRequest, ToolInvocation,
    ToolRequest,
};
use crate::provider::{ProviderClient, ProviderConfig, ProviderId};
use async_stream::stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::Value;
use tracing::debug;

/// Client for any OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiCompatClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a client; `config.endpoint` is the full completions URL
    pub fn new(config: ProviderConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn request(&self, body: &ChatCompletionRequest) -> reqwest::RequestBuilder {
        let request = self.http.post(&self.config.endpoint).json(body);
        self.config.auth.apply(request, &self.config.api_key)
    }
}

fn messages(system: &str, prompt: &[PromptMessage]) -> Vec<ChatCompletionMessage> {
    let system = (!system.trim().is_empty()).then(|| ChatCompletionMessage {
        role: "system".to_string(),
        content: system.to_string(),
    });
    system
        .into_iter()
        .chain(prompt.iter().map(|m| ChatCompletionMessage {
            role: match m.role {
                ChatRole::User => "user".to_string(),
                ChatRole::Model => "assistant".to_string(),
            },
            content: m.content.clone(),
        }))
        .collect()
}

/// Outcome of decoding one streamed line
enum DeltaOutcome {
    Fragment(String),
    Done,
    Skip,
}

fn decode_delta(line: &str) -> DeltaOutcome {
    match classify_line(line) {
        DataLine::Done => DeltaOutcome::Done,
        DataLine::Ignore => DeltaOutcome::Skip,
        DataLine::Data(payload) => match serde_json::from_str::<ChatCompletionChunk>(payload) {
            Ok(chunk) => match chunk.delta_content() {
                Some(content) if !content.is_empty() => DeltaOutcome::Fragment(content),
                _ => DeltaOutcome::Skip,
            },
            Err(e) => {
                debug!(error = %e, "Skipping malformed delta stream line");
                DeltaOutcome::Skip
            }
        },
    }
}

#[async_trait]
impl ProviderClient for OpenAiCompatClient {
    fn provider(&self) -> ProviderId {
        self.config.provider
    }

    async fn stream_text(&self, request: &TextRequest) -> Result<FragmentStream, AppError> {
        self.config.ensure_api_key()?;

        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages(&request.system, &request.messages),
            temperature: request.temperature,
            stream: Some(true),
            tools: None,
            max_tokens: None,
        };

        debug!(
            provider = %self.config.provider,
            endpoint = %self.config.endpoint,
            model = %self.config.model,
            "Calling chat completions streaming API"
        );

        let response = http::send(self.config.provider, self.request(&body)).await?;

        let provider = self.config.provider;
        let mut bytes = Box::pin(response.bytes_stream());
        let events = stream! {
            let mut decoder = LineDecoder::new();
            let mut fragments = 0usize;
            'read: loop {
                let (lines, done) = match bytes.next().await {
                    Some(Ok(chunk)) => (decoder.push(&chunk), false),
                    Some(Err(e)) => {
                        yield Err(AppError::Transport(format!("Stream from {} interrupted: {}", provider, e)));
                        return;
                    }
                    None => (decoder.finish().into_iter().collect::<Vec<_>>(), true),
                };
                for line in lines {
                    match decode_delta(&line) {
                        DeltaOutcome::Fragment(text) => {
                            fragments += 1;
                            yield Ok(StreamEvent::Fragment(text));
                        }
                        DeltaOutcome::Done => break 'read,
                        DeltaOutcome::Skip => {}
                    }
                }
                if done {
                    break;
                }
            }
            debug!(provider = %provider, fragments, "Delta stream finished");
        };

        Ok(Box::pin(events))
    }

    async fn complete_with_tools(&self, request: &ToolRequest) -> Result<ProviderReply, AppError> {
        self.config.ensure_api_key()?;

        let tools = request
            .tools
            .iter()
            .map(|t| ToolDefinition {
                kind: "function".to_string(),
                function: FunctionDefinition {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect::<Vec<_>>();

        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages(&request.system, &request.messages),
            temperature: request.temperature,
            stream: None,
            tools: (!tools.is_empty()).then_some(tools),
            max_tokens: Some(request.max_output_tokens),
        };

        debug!(
            provider = %self.config.provider,
            model = %self.config.model,
            "Calling chat completions API with tools"
        );

        let response = http::send(self.config.provider, self.request(&body)).await?;
        let response_body = response.text().await.map_err(|e| {
            AppError::Transport(format!(
                "Failed to read response body from {}: {}",
                self.config.provider, e
            ))
        })?;

        let parsed: ChatCompletionResponse = serde_json::from_str(&response_body).map_err(|e| {
            AppError::Transport(format!(
                "Failed to parse JSON response from {}: {}",
                self.config.provider, e
            ))
        })?;

        let message = parsed.choices.into_iter().next().ok_or_else(|| {
            AppError::Transport(format!("{} response contains no choices", self.config.provider))
        })?;

        // Only the first call is acted on, so only its arguments must decode
        let mut tool_calls = Vec::new();
        for (index, call) in message
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
        {
            let arguments = match decode_arguments(&call.function.arguments) {
                Ok(arguments) => arguments,
                Err(e) if index == 0 => {
                    return Err(AppError::ActionDecode(format!(
                        "arguments of {} are not valid JSON: {}",
                        call.function.name, e
                    )));
                }
                Err(_) => Value::String(call.function.arguments),
            };
            tool_calls.push(ToolInvocation {
                name: call.function.name,
                arguments,
            });
        }

        let reply = ProviderReply {
            text: message.message.content.unwrap_or_default(),
            tool_calls,
        };

        debug!(
            response_len = reply.text.len(),
            tool_calls = reply.tool_calls.len(),
            "Received chat completion"
        );
        Ok(reply)
    }
}

fn decode_arguments(raw: &str) -> Result<Value, serde_json::Error> {
    if raw.trim().is_empty() {
        Ok(Value::Object(Default::default()))
    } else {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::types::ToolSchema;
    use mockito::{Matcher, Server};
    use serial_test::serial;

    fn client(endpoint: &str, key: &str) -> OpenAiCompatClient {
        let config = ProviderConfig::new(ProviderId::OpenAi, key).with_endpoint(endpoint);
        OpenAiCompatClient::new(config, reqwest::Client::new())
    }

    fn text_request() -> TextRequest {
        TextRequest {
            system: "Translate".to_string(),
            messages: vec![PromptMessage::user("Hyung said hello")],
            temperature: 0.3,
            top_p: None,
        }
    }

    fn tool_request() -> ToolRequest {
        ToolRequest {
            system: "assistant".to_string(),
            messages: vec![PromptMessage::user("remove Hyung")],
            tools: vec![ToolSchema {
                name: "remove_from_glossary".to_string(),
                description: "Remove terms".to_string(),
                parameters: serde_json::json!({"type": "object"}),
            }],
            temperature: 0.3,
            max_output_tokens: 2000,
        }
    }

    async fn fragments(stream: FragmentStream) -> Vec<String> {
        stream
            .map(|e| match e.unwrap() {
                StreamEvent::Fragment(text) => text,
                other => panic!("unexpected event {:?}", other),
            })
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_stream_empty_api_key() {
        let result = client("http://127.0.0.1:9/v1/chat/completions", " ")
            .stream_text(&text_request())
            .await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_stream_skips_noise_and_stops_at_done() {
        let mut server = Server::new_async().await;
        let body = concat!(
            ": keep-alive\n\n",
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Kakak \"}}]}\n\n",
            "data: {broken\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"berkata\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"after done\"}}]}\n\n",
        );
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJsonString(
                r#"{"model":"gpt-4o-mini","stream":true}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let endpoint = format!("{}/v1/chat/completions", server.url());
        let stream = client(&endpoint, "test-key").stream_text(&text_request()).await.unwrap();
        let texts = fragments(stream).await;

        mock.assert_async().await;
        assert_eq!(texts, vec!["Kakak ", "berkata"]);
    }

    #[tokio::test]
    #[serial]
    async fn test_stream_sends_system_then_user() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::Regex(
                r#""messages":\[\{"role":"system","content":"Translate"\},\{"role":"user","content":"Hyung said hello"\}\]"#
                    .to_string(),
            ))
            .with_status(200)
            .with_body("data: [DONE]\n")
            .create_async()
            .await;

        let endpoint = format!("{}/chat/completions", server.url());
        let stream = client(&endpoint, "k").stream_text(&text_request()).await.unwrap();
        assert!(fragments(stream).await.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    #[serial]
    async fn test_stream_error_status_fallback_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let endpoint = format!("{}/chat/completions", server.url());
        let err = client(&endpoint, "k").stream_text(&text_request()).await.err().unwrap();
        assert_eq!(err.to_string(), "API error (HTTP 503)");
    }

    #[tokio::test]
    #[serial]
    async fn test_complete_with_tools_decodes_arguments() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::Regex(r#""tools":\[\{"type":"function""#.to_string()))
            .with_status(200)
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":null,"tool_calls":[
                    {"id":"call_1","type":"function","function":{"name":"remove_from_glossary","arguments":"{\"originals\":[\"Hyung\"]}"}},
                    {"id":"call_2","type":"function","function":{"name":"add_to_glossary","arguments":"{}"}}
                ]}}]}"#,
            )
            .create_async()
            .await;

        let endpoint = format!("{}/chat/completions", server.url());
        let reply = client(&endpoint, "k").complete_with_tools(&tool_request()).await.unwrap();
        assert_eq!(reply.text, "");
        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.tool_calls[0].name, "remove_from_glossary");
        assert_eq!(reply.tool_calls[0].arguments["originals"][0], "Hyung");
    }

    #[tokio::test]
    #[serial]
    async fn test_complete_with_tools_bad_arguments() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(
                r#"{"choices":[{"message":{"tool_calls":[
                    {"function":{"name":"add_to_glossary","arguments":"{items: oops"}}
                ]}}]}"#,
            )
            .create_async()
            .await;

        let endpoint = format!("{}/chat/completions", server.url());
        let err = client(&endpoint, "k").complete_with_tools(&tool_request()).await.unwrap_err();
        assert!(matches!(err, AppError::ActionDecode(_)));
    }

    #[tokio::test]
    #[serial]
    async fn test_complete_with_tools_bad_later_call_is_kept_raw() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(
                r#"{"choices":[{"message":{"tool_calls":[
                    {"function":{"name":"remove_from_glossary","arguments":"{\"originals\":[\"Hyung\"]}"}},
                    {"function":{"name":"add_to_glossary","arguments":"{items: oops"}}
                ]}}]}"#,
            )
            .create_async()
            .await;

        let endpoint = format!("{}/chat/completions", server.url());
        let reply = client(&endpoint, "k").complete_with_tools(&tool_request()).await.unwrap();
        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.tool_calls[0].name, "remove_from_glossary");
        assert_eq!(reply.tool_calls[0].arguments["originals"][0], "Hyung");
        assert_eq!(reply.tool_calls[1].arguments, Value::String("{items: oops".to_string()));
    }

    #[tokio::test]
    #[serial]
    async fn test_complete_with_tools_plain_text() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"The glossary has 3 items."}}]}"#)
            .create_async()
            .await;

        let endpoint = format!("{}/chat/completions", server.url());
        let reply = client(&endpoint, "k").complete_with_tools(&tool_request()).await.unwrap();
        assert_eq!(reply.text, "The glossary has 3 items.");
        assert!(reply.tool_calls.is_empty());
    }
}
