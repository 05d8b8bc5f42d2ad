//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Saved-translation database configuration
    pub database: DatabaseConfig,
    /// Provider transport configuration
    pub provider: ProviderTransportConfig,
    /// Assistant turn configuration
    pub assistant: AssistantConfig,
    /// Translation sampling configuration
    pub translation: TranslationConfig,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite file holding saved translations
    pub path: String,
}

/// Provider transport configuration
#[derive(Debug, Clone)]
pub struct ProviderTransportConfig {
    /// Key used when the workspace has no key for the active provider
    pub fallback_api_key: Option<String>,
    /// Whole-request timeout for provider calls (in seconds)
    pub request_timeout_secs: u64,
}

/// Assistant configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantConfig {
    /// Number of trailing visible messages sent as conversation context
    pub history_window: usize,
    /// Output token cap for assistant replies
    pub max_output_tokens: u32,
    /// Sampling temperature for assistant replies
    pub temperature: f32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            history_window: 8,
            max_output_tokens: 2000,
            temperature: 0.3,
        }
    }
}

/// Translation sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslationConfig {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling cutoff (native stream family only)
    pub top_p: f32,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.95,
        }
    }
}

/// Partial update for [`AssistantConfig`]
#[derive(Debug, Default, Deserialize)]
pub struct AssistantConfigUpdate {
    /// New history window (optional)
    pub history_window: Option<usize>,
    /// New output token cap (optional)
    pub max_output_tokens: Option<u32>,
    /// New temperature (optional)
    pub temperature: Option<f32>,
}

/// Validate and apply an assistant configuration update
///
/// Either every field in the update is valid and applied, or the original
/// configuration is returned untouched inside the error path.
///
/// # Returns
/// * `Ok(AssistantConfig)` - The updated configuration
/// * `Err(AppError)` - If validation fails
pub fn validate_and_apply_update(
    mut config: AssistantConfig,
    update: AssistantConfigUpdate,
) -> Result<AssistantConfig, AppError> {
    if let Some(window) = update.history_window {
        if window == 0 {
            return Err(AppError::Configuration(
                "history_window must be > 0".to_string(),
            ));
        }
        config.history_window = window;
    }

    if let Some(tokens) = update.max_output_tokens {
        if tokens == 0 {
            return Err(AppError::Configuration(
                "max_output_tokens must be > 0".to_string(),
            ));
        }
        config.max_output_tokens = tokens;
    }

    if let Some(temperature) = update.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AppError::Configuration(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        config.temperature = temperature;
    }

    Ok(config)
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig {
                path: env::var("NOVTL_DB_PATH").unwrap_or_else(|_| {
                    if let Some(home) = env::var_os("HOME") {
                        format!("{}/.novtl/novtl.db", home.to_string_lossy())
                    } else {
                        ".novtl/novtl.db".to_string()
                    }
                }),
            },
            provider: ProviderTransportConfig {
                fallback_api_key: env::var("API_KEY").ok().filter(|k| !k.trim().is_empty()),
                request_timeout_secs: env::var("NOVTL_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(120),
            },
            assistant: AssistantConfig::default(),
            translation: TranslationConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: ".novtl/novtl.db".to_string(),
            },
            provider: ProviderTransportConfig {
                fallback_api_key: None,
                request_timeout_secs: 120,
            },
            assistant: AssistantConfig::default(),
            translation: TranslationConfig::default(),
        }
    }
}
