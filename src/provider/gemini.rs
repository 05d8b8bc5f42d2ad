//! Gemini API client
//!
//! Native stream family: `streamGenerateContent?alt=sse` delivers one whole
//! response object per `data:` line. A chunk without text is an empty
//! fragment, not an error.

use crate::chat::ChatRole;
use crate::error::AppError;
use crate::provider::gemini_types::{
    FunctionDeclaration, GeminiApiRequest, GeminiApiResponse, GeminiTool, GenerationConfig,
    RequestContent, RequestPart, SystemInstruction,
};
use crate::provider::http;
use crate::provider::sse::{classify_line, DataLine, LineDecoder};
use crate::provider::types::{
    FragmentStream, PromptMessage, ProviderReply, StreamEvent, TextRequest, ToolInvocation,
    ToolRequest,
};
use crate::provider::{ProviderClient, ProviderConfig, ProviderId};
use async_stream::stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::debug;

/// Client for the Gemini REST API
pub struct GeminiClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Create a client; `config.endpoint` is the API base URL
    pub fn new(config: ProviderConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    fn request(&self, url: &str, body: &GeminiApiRequest) -> reqwest::RequestBuilder {
        let request = self.http.post(url).json(body);
        self.config.auth.apply(request, &self.config.api_key)
    }
}

fn contents(messages: &[PromptMessage]) -> Vec<RequestContent> {
    messages
        .iter()
        .map(|m| RequestContent {
            role: match m.role {
                ChatRole::User => "user".to_string(),
                ChatRole::Model => "model".to_string(),
            },
            parts: vec![RequestPart {
                text: m.content.clone(),
            }],
        })
        .collect()
}

fn system_instruction(system: &str) -> Option<SystemInstruction> {
    if system.trim().is_empty() {
        return None;
    }
    Some(SystemInstruction {
        parts: vec![RequestPart {
            text: system.to_string(),
        }],
    })
}

/// Outcome of decoding one streamed line
enum ChunkOutcome {
    Fragment(String),
    Blocked(String),
    Skip,
}

fn decode_chunk(line: &str) -> ChunkOutcome {
    let DataLine::Data(payload) = classify_line(line) else {
        return ChunkOutcome::Skip;
    };
    match serde_json::from_str::<GeminiApiResponse>(payload) {
        Ok(chunk) => match chunk.block_reason() {
            Some(reason) => ChunkOutcome::Blocked(reason.to_string()),
            None => ChunkOutcome::Fragment(chunk.text()),
        },
        Err(e) => {
            debug!(error = %e, "Skipping malformed Gemini stream line");
            ChunkOutcome::Skip
        }
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn provider(&self) -> ProviderId {
        self.config.provider
    }

    async fn stream_text(&self, request: &TextRequest) -> Result<FragmentStream, AppError> {
        self.config.ensure_api_key()?;

        let body = GeminiApiRequest {
            contents: contents(&request.messages),
            system_instruction: system_instruction(&request.system),
            tools: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(request.temperature),
                top_p: request.top_p,
                max_output_tokens: None,
            }),
        };

        let url = self.url("streamGenerateContent");
        debug!(
            url = %url,
            model = %self.config.model,
            messages = request.messages.len(),
            "Calling Gemini streaming API"
        );

        let response = http::send(
            self.config.provider,
            self.request(&url, &body).query(&[("alt", "sse")]),
        )
        .await?;

        let provider = self.config.provider;
        let mut bytes = Box::pin(response.bytes_stream());
        let events = stream! {
            let mut decoder = LineDecoder::new();
            let mut fragments = 0usize;
            loop {
                let (lines, done) = match bytes.next().await {
                    Some(Ok(chunk)) => (decoder.push(&chunk), false),
                    Some(Err(e)) => {
                        yield Err(AppError::Transport(format!("Stream from {} interrupted: {}", provider, e)));
                        return;
                    }
                    None => (decoder.finish().into_iter().collect::<Vec<_>>(), true),
                };
                for line in lines {
                    match decode_chunk(&line) {
                        ChunkOutcome::Fragment(text) => {
                            fragments += 1;
                            yield Ok(StreamEvent::Fragment(text));
                        }
                        ChunkOutcome::Blocked(reason) => {
                            yield Err(AppError::Transport(format!("Gemini API blocked the prompt: {}", reason)));
                            return;
                        }
                        ChunkOutcome::Skip => {}
                    }
                }
                if done {
                    break;
                }
            }
            debug!(provider = %provider, fragments, "Gemini stream finished");
        };

        Ok(Box::pin(events))
    }

    async fn complete_with_tools(&self, request: &ToolRequest) -> Result<ProviderReply, AppError> {
        self.config.ensure_api_key()?;

        let declarations = request
            .tools
            .iter()
            .map(|t| FunctionDeclaration {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.clone(),
            })
            .collect::<Vec<_>>();

        let body = GeminiApiRequest {
            contents: contents(&request.messages),
            system_instruction: system_instruction(&request.system),
            tools: (!declarations.is_empty()).then(|| {
                vec![GeminiTool {
                    function_declarations: declarations,
                }]
            }),
            generation_config: Some(GenerationConfig {
                temperature: Some(request.temperature),
                top_p: None,
                max_output_tokens: Some(request.max_output_tokens),
            }),
        };

        let url = self.url("generateContent");
        debug!(url = %url, model = %self.config.model, "Calling Gemini API with tools");

        let response = http::send(self.config.provider, self.request(&url, &body)).await?;
        let response_body = response.text().await.map_err(|e| {
            AppError::Transport(format!("Failed to read response body from Gemini API: {}", e))
        })?;

        let parsed: GeminiApiResponse = serde_json::from_str(&response_body).map_err(|e| {
            AppError::Transport(format!("Failed to parse JSON response from Gemini API: {}", e))
        })?;

        if let Some(reason) = parsed.block_reason() {
            return Err(AppError::Transport(format!(
                "Gemini API blocked the prompt: {}",
                reason
            )));
        }

        let reply = ProviderReply {
            text: parsed.text(),
            tool_calls: parsed
                .function_calls()
                .into_iter()
                .map(|call| ToolInvocation {
                    name: call.name.clone(),
                    arguments: call.args.clone(),
                })
                .collect(),
        };

        debug!(
            response_len = reply.text.len(),
            tool_calls = reply.tool_calls.len(),
            "Received response from Gemini API"
        );
        Ok(reply)
    }
}
