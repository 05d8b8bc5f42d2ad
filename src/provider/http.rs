//! HTTP helpers shared by the provider clients

use crate::error::AppError;
use crate::provider::ProviderId;
use serde_json::Value;

/// Send a prepared request, mapping connection failures to transport errors
pub async fn send(
    provider: ProviderId,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, AppError> {
    let response = request.send().await.map_err(|e| {
        AppError::Transport(format!("Failed to send HTTP request to {}: {}", provider, e))
    })?;
    ensure_success(provider, response).await
}

/// Pass 2xx responses through; turn anything else into a transport error
///
/// The message comes from the provider's structured error body when it has
/// one, otherwise it names the status code.
pub async fn ensure_success(
    provider: ProviderId,
    response: reqwest::Response,
) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let status_code = status.as_u16();
    let body = response.text().await.unwrap_or_default();

    tracing::error!(
        provider = %provider,
        status_code = status_code,
        error_body = %body,
        "Provider returned error status"
    );

    Err(AppError::Transport(error_message(status_code, &body)))
}

/// Extract a user-facing message from an error body
///
/// Understands `{"error": {"message": "..."}}` (OpenAI-style and Gemini) and
/// `{"error": "..."}`; anything else yields a status-coded generic message.
pub fn error_message(status_code: u16, body: &str) -> String {
    let structured = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        match v.get("error") {
            Some(Value::String(message)) => Some(message.clone()),
            Some(error) => error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            None => None,
        }
    });

    match structured {
        Some(message) if !message.trim().is_empty() => message,
        _ => format!("API error (HTTP {})", status_code),
    }
}
