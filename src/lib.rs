//! codesplain — explain uploaded source files with an LLM, deduplicated by
//! a content-addressed cache.
//!
//! Module map:
//! - [`api`] — axum router, shared state, and the `/upload` + `/health` routes
//! - [`cache`] — SHA-256 content-addressed explanation cache with per-key
//!   single-flight on misses
//! - [`providers`] — completion provider trait and the OpenAI-compatible client
//! - [`config`] — server and provider configuration types
//! - [`error`] — tagged error type and crate `Result` alias

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod providers;
