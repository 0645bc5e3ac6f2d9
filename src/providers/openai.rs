//! OpenAI-compatible chat completions provider.
//!
//! Auth priority: config key → OPENAI_API_KEY environment variable.
//!
//! Speaks the `/chat/completions` REST shape, which most hosted and local
//! completion backends expose, so `api_base` can point anywhere compatible.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{ExplainError, Result};

use super::CompletionProvider;

/// Chat completions client authenticated with a bearer API key.
///
/// Use [`OpenAiProvider::from_config`] to build from config plus environment,
/// or [`OpenAiProvider::new_with_key`] for testing / manual construction.
pub struct OpenAiProvider {
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
    client: Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl OpenAiProvider {
    /// Build a provider with an explicit API key and otherwise default config.
    pub fn new_with_key(api_key: &str, model: &str) -> Self {
        let defaults = ProviderConfig::default();
        Self {
            api_key: api_key.to_string(),
            api_base: defaults.api_base,
            model: model.to_string(),
            temperature: defaults.temperature,
            client: Self::build_client(),
        }
    }

    /// Build from config, resolving the API key in priority order.
    ///
    /// 1. `explicit_key` — value passed by the caller (config file, flag)
    /// 2. `OPENAI_API_KEY` — read from the environment
    ///
    /// Returns `None` when no non-empty key is available.
    pub fn from_config(explicit_key: Option<&str>, config: &ProviderConfig) -> Option<Self> {
        let env_key = std::env::var("OPENAI_API_KEY").ok();
        let api_key = Self::resolve_key(explicit_key, env_key.as_deref())?;
        Some(Self {
            api_key,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            client: Self::build_client(),
        })
    }

    /// Pick the first non-empty key from the priority chain.
    fn resolve_key(explicit_key: Option<&str>, env_key: Option<&str>) -> Option<String> {
        if let Some(k) = explicit_key.filter(|k| !k.is_empty()) {
            return Some(k.to_string());
        }
        if let Some(k) = env_key.filter(|k| !k.is_empty()) {
            return Some(k.to_string());
        }
        None
    }

    fn build_client() -> Client {
        Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client")
    }

    /// Build the `/chat/completions` request body: a single user-role
    /// message with the fixed sampling temperature.
    pub fn build_request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        })
    }

    /// Extract the completion text from a chat completions response.
    pub fn extract_text(response: &Value) -> Option<String> {
        response["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
    }

    /// Pull a useful message out of the standard error envelope, falling
    /// back to the raw body text.
    fn extract_error_message(body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or_else(|| body.to_string())
    }

    /// Full URL for the chat completions endpoint.
    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = self.build_request_body(prompt);

        debug!("chat completion request to model {}", self.model);

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExplainError::Network(format!("completion request failed: {}", e)))?;

        if response.status().is_success() {
            let json: Value = response.json().await.map_err(|e| {
                ExplainError::MalformedResponse(format!("failed to parse response body: {}", e))
            })?;
            return Self::extract_text(&json).ok_or_else(|| {
                ExplainError::MalformedResponse("response contained no completion text".to_string())
            });
        }

        let status = response.status().as_u16();
        let error_text = response.text().await.unwrap_or_default();
        let message = Self::extract_error_message(&error_text);
        Err(ExplainError::from_provider_status(status, message))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
