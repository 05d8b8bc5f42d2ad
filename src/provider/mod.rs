//! Provider adapter
//!
//! Maps the workspace's provider selection to network parameters and hides
//! each provider's wire format behind [`ProviderClient`]. Streaming calls
//! yield an ordered sequence of text fragments whose concatenation is the
//! complete reply; tool-enabled calls return the reply text together with
//! any function invocations.

pub mod gemini;
pub mod gemini_types;
pub mod http;
pub mod openai;
pub mod openai_types;
pub mod sse;
pub mod types;

pub use gemini::GeminiClient;
pub use openai::OpenAiCompatClient;
pub use types::{
    FragmentStream, PromptMessage, ProviderReply, StreamEvent, TextRequest, ToolInvocation,
    ToolRequest, ToolSchema,
};

use crate::config::Config;
use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Base URL of the Gemini REST API
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Supported text-generation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    /// Google Gemini (native stream family)
    #[serde(rename = "Gemini")]
    Gemini,
    /// OpenAI chat completions
    #[serde(rename = "OpenAI (GPT)")]
    OpenAi,
    /// DeepSeek chat completions
    #[serde(rename = "DeepSeek")]
    DeepSeek,
    /// xAI Grok chat completions
    #[serde(rename = "Grok (xAI)")]
    Grok,
}

impl ProviderId {
    /// All providers, in display order
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Gemini,
        ProviderId::OpenAi,
        ProviderId::DeepSeek,
        ProviderId::Grok,
    ];

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "Gemini",
            ProviderId::OpenAi => "OpenAI (GPT)",
            ProviderId::DeepSeek => "DeepSeek",
            ProviderId::Grok => "Grok (xAI)",
        }
    }

    /// Model used when the workspace has not selected one
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini-flash-lite-latest",
            ProviderId::OpenAi => "gpt-4o-mini",
            ProviderId::DeepSeek => "deepseek-chat",
            ProviderId::Grok => "grok-2-latest",
        }
    }

    /// Default endpoint (a base URL for the native family)
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderId::Gemini => GEMINI_API_BASE_URL,
            ProviderId::OpenAi => "https://api.openai.com/v1/chat/completions",
            ProviderId::DeepSeek => "https://api.deepseek.com/chat/completions",
            ProviderId::Grok => "https://api.x.ai/v1/chat/completions",
        }
    }

    /// Wire family spoken by the provider
    pub fn wire_format(&self) -> WireFormat {
        match self {
            ProviderId::Gemini => WireFormat::NativeStream,
            ProviderId::OpenAi | ProviderId::DeepSeek | ProviderId::Grok => WireFormat::DeltaStream,
        }
    }

    /// How the API key is attached to requests
    pub fn auth_scheme(&self) -> AuthScheme {
        match self.wire_format() {
            WireFormat::NativeStream => AuthScheme::QueryKey,
            WireFormat::DeltaStream => AuthScheme::BearerHeader,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Wire family of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireFormat {
    /// One call yields a sequence of whole response objects
    NativeStream,
    /// OpenAI-style `data:` lines carrying `choices[0].delta.content`
    DeltaStream,
}

/// How the API key is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthScheme {
    /// `?key=<api key>` query parameter
    QueryKey,
    /// `Authorization: Bearer <api key>` header
    BearerHeader,
}

impl AuthScheme {
    /// Attach the key to a request
    pub fn apply(&self, request: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
        match self {
            AuthScheme::QueryKey => request.query(&[("key", api_key)]),
            AuthScheme::BearerHeader => request.bearer_auth(api_key),
        }
    }
}

/// Fully resolved network parameters for one provider
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    /// Which backend
    pub provider: ProviderId,
    /// Model identifier sent to the backend
    pub model: String,
    /// API key; must be non-empty before any call
    pub api_key: String,
    /// Endpoint URL (base URL for the native family)
    pub endpoint: String,
    /// How the key is attached
    pub auth: AuthScheme,
    /// Wire family
    pub wire: WireFormat,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("auth", &self.auth)
            .field("wire", &self.wire)
            .finish()
    }
}

impl ProviderConfig {
    /// Provider defaults with the given key
    pub fn new(provider: ProviderId, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: api_key.into(),
            endpoint: provider.default_endpoint().to_string(),
            auth: provider.auth_scheme(),
            wire: provider.wire_format(),
        }
    }

    /// Override the endpoint (for testing or proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Fail unless an API key is present
    pub fn ensure_api_key(&self) -> Result<(), AppError> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Configuration(format!(
                "API key for {} is not set. Enter a key first.",
                self.provider
            )));
        }
        Ok(())
    }
}

/// Provider selection stored in the workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    /// Provider used for translation and the assistant
    pub active_provider: ProviderId,
    /// API key per provider
    #[serde(default)]
    pub api_keys: HashMap<ProviderId, String>,
    /// Selected model per provider
    #[serde(default)]
    pub selected_models: HashMap<ProviderId, String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            active_provider: ProviderId::Gemini,
            api_keys: HashMap::new(),
            selected_models: HashMap::new(),
        }
    }
}

impl ProviderSettings {
    /// Resolve the active provider into network parameters
    ///
    /// The workspace key wins; `fallback_api_key` (usually from the
    /// environment) is used only when that key is blank.
    ///
    /// # Errors
    /// * `AppError::Configuration` if no usable key exists
    pub fn resolve(&self, fallback_api_key: Option<&str>) -> Result<ProviderConfig, AppError> {
        let provider = self.active_provider;
        let api_key = self
            .api_keys
            .get(&provider)
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .or_else(|| fallback_api_key.map(str::trim).filter(|k| !k.is_empty()))
            .unwrap_or_default();

        let model = self
            .selected_models
            .get(&provider)
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .unwrap_or(provider.default_model());

        let config = ProviderConfig::new(provider, api_key).with_model(model);
        config.ensure_api_key()?;
        Ok(config)
    }
}

/// A connected text-generation backend
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Which provider this client talks to
    fn provider(&self) -> ProviderId;

    /// Start a streaming completion
    ///
    /// Transport failures before the first byte are returned directly;
    /// failures mid-stream arrive as an `Err` item and end the stream.
    async fn stream_text(&self, request: &TextRequest) -> Result<FragmentStream, AppError>;

    /// Single-shot completion with tool declarations
    async fn complete_with_tools(&self, request: &ToolRequest) -> Result<ProviderReply, AppError>;
}

/// Build the client for a resolved configuration
///
/// # Errors
/// * `AppError::Configuration` if the key is empty; no request is made
pub fn connect(
    config: ProviderConfig,
    http: reqwest::Client,
) -> Result<Box<dyn ProviderClient>, AppError> {
    config.ensure_api_key()?;
    Ok(match config.wire {
        WireFormat::NativeStream => Box::new(GeminiClient::new(config, http)),
        WireFormat::DeltaStream => Box::new(OpenAiCompatClient::new(config, http)),
    })
}

/// Shared HTTP client with the configured request timeout
pub fn build_http_client(config: &Config) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.provider.request_timeout_secs))
        .build()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_workspace_key() {
        let mut settings = ProviderSettings::default();
        settings.api_keys.insert(ProviderId::Gemini, "ui-key".to_string());
        let config = settings.resolve(Some("env-key")).unwrap();
        assert_eq!(config.api_key, "ui-key");
        assert_eq!(config.model, "gemini-flash-lite-latest");
        assert_eq!(config.wire, WireFormat::NativeStream);
    }

    #[test]
    fn test_resolve_falls_back_to_env_key() {
        let mut settings = ProviderSettings {
            active_provider: ProviderId::DeepSeek,
            ..Default::default()
        };
        settings.api_keys.insert(ProviderId::DeepSeek, "   ".to_string());
        settings
            .selected_models
            .insert(ProviderId::DeepSeek, "deepseek-reasoner".to_string());
        let config = settings.resolve(Some("env-key")).unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.model, "deepseek-reasoner");
        assert_eq!(config.endpoint, "https://api.deepseek.com/chat/completions");
        assert_eq!(config.auth, AuthScheme::BearerHeader);
    }

    #[test]
    fn test_resolve_without_key_is_configuration_error() {
        let settings = ProviderSettings {
            active_provider: ProviderId::Grok,
            ..Default::default()
        };
        let err = settings.resolve(None).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains("Grok (xAI)"));
    }

    #[test]
    fn test_connect_rejects_empty_key() {
        let result = connect(ProviderConfig::new(ProviderId::OpenAi, ""), reqwest::Client::new());
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig::new(ProviderId::OpenAi, "sk-secret");
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }

    #[test]
    fn test_provider_ids_serialize_as_display_names() {
        let mut settings = ProviderSettings::default();
        settings.api_keys.insert(ProviderId::OpenAi, "k".to_string());
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["activeProvider"], "Gemini");
        assert_eq!(json["apiKeys"]["OpenAI (GPT)"], "k");
    }
}
