//! Completion provider abstraction.
//!
//! The explanation cache talks to a [`CompletionProvider`] trait object so
//! tests can substitute a scripted fake for the real API client.

pub mod openai;

pub use openai::OpenAiProvider;

use async_trait::async_trait;

use crate::error::Result;

/// A text-completion backend that turns a prompt into explanation text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send a single user-role prompt and return the completion text.
    ///
    /// The call is synchronous from the caller's perspective; the only
    /// timeout is the one enforced by the underlying HTTP client.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Model identifier sent upstream with every request.
    fn model(&self) -> &str;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}
