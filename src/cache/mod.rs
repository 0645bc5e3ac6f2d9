//! Content-addressed explanation caching.

pub mod explanation_cache;

pub use explanation_cache::{CacheStats, ExplanationCache};
