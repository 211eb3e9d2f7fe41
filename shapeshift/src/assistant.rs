//! Text-generation backend
//!
//! The session only needs one call: send a prompt, get raw text back.
//! [`GeminiAssistant`] implements it against the Gemini `generateContent`
//! REST endpoint. There is exactly one request per turn, with no retries.

use crate::app_config::AssistantConfig;
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors from the round trip to the text-generation backend
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("API key not set; export {env_var} to use the assistant")]
    MissingApiKey { env_var: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend response contained no text")]
    EmptyResponse,
}

/// Something that turns a prompt into raw reply text
pub trait Assistant {
    fn generate(&self, prompt: &str) -> Result<String, TransportError>;
}

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiAssistant {
    http: HttpClient,
    config: AssistantConfig,
    api_key: String,
}

impl GeminiAssistant {
    /// Build a client, reading the API key from the configured environment variable
    pub fn from_config(config: &AssistantConfig) -> Result<Self, TransportError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| TransportError::MissingApiKey {
                env_var: config.api_key_env.clone(),
            })?;
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl Assistant for GeminiAssistant {
    fn generate(&self, prompt: &str) -> Result<String, TransportError> {
        let endpoint = self.endpoint();
        log::info!("Sending prompt to {} ({} chars)", self.config.model, prompt.len());

        let payload = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .map_err(redact)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response_payload: Value = response.json().map_err(redact)?;
        extract_text(&response_payload).ok_or(TransportError::EmptyResponse)
    }
}

/// Drop the request URL from the error; it carries the API key as a query parameter
fn redact(error: reqwest::Error) -> TransportError {
    TransportError::Http(error.without_url())
}

/// Pull `candidates[0].content.parts[0].text` out of a `generateContent` reply
fn extract_text(response_payload: &Value) -> Option<String> {
    response_payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .and_then(|parts| parts.first())
        .and_then(|part| part.get("text"))
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}
