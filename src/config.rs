//! Service configuration types.

use serde::{Deserialize, Serialize};

/// Default base URL for the OpenAI-compatible completion API.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Model used for explanation requests when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Sampling temperature for explanation requests. Kept low so repeat
/// explanations of similar files stay consistent.
pub const EXPLAIN_TEMPERATURE: f32 = 0.3;

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (default: 127.0.0.1).
    pub bind: String,
    /// Listen port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Completion provider configuration.
///
/// The API key is deliberately not part of this struct; it is resolved from
/// the environment at startup so it never ends up serialized anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the chat completions API.
    pub api_base: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: EXPLAIN_TEMPERATURE,
        }
    }
}
