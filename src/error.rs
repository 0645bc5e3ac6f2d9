//! Crate-wide error type and result alias.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ExplainError>;

/// Failures the explanation pipeline can surface.
///
/// Provider-side failures are tagged by kind so callers can log and map them
/// deliberately instead of catching a single opaque error. The HTTP boundary
/// maps every variant below to a 500 with the error's display text; none of
/// them are retried and none leave a cache entry behind.
#[derive(Debug, Error)]
pub enum ExplainError {
    /// The completion request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// The provider rejected our credentials (HTTP 401/403).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The provider throttled the request (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider answered 2xx but the body was not the expected shape.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Any other provider-side failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// Bad or missing configuration (API key, bind address).
    #[error("config error: {0}")]
    Config(String),
}

impl ExplainError {
    /// Classify a non-success provider status code into a tagged variant.
    pub fn from_provider_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Auth(message),
            429 => Self::RateLimited(message),
            _ => Self::Provider(message),
        }
    }
}
