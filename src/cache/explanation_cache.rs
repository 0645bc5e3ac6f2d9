//! Content-addressed explanation cache.
//!
//! Cache key is the hex SHA-256 digest of the uploaded content's bytes, so
//! renames and duplicate uploads of byte-identical files share one entry.
//! Entries are in-memory only and live for the process lifetime; there is
//! no eviction, TTL, or persistence. An entry is written once on first miss
//! and never updated afterwards.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::providers::CompletionProvider;

/// Prompt prefix sent to the provider ahead of the file contents.
const EXPLAIN_PROMPT_PREFIX: &str = "Explain the following Python code in detail:\n\n";

/// Explanation cache owning the completion provider.
///
/// Shared across request handlers via `Arc`; [`lookup_or_compute`] is the
/// sole mutating entry point.
///
/// [`lookup_or_compute`]: ExplanationCache::lookup_or_compute
pub struct ExplanationCache {
    provider: Arc<dyn CompletionProvider>,
    /// content hash → explanation text
    entries: DashMap<String, String>,
    /// Per-key gates serializing concurrent misses on the same content.
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ExplanationCache {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Hex SHA-256 digest of `content`'s bytes.
    ///
    /// The upload path decodes strictly as UTF-8 before calling in, so these
    /// bytes are exactly the raw upload bytes and the key cannot diverge
    /// from the prompt text built from the same string.
    pub fn content_key(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Return the cached explanation for `content`, computing it on miss.
    ///
    /// Concurrent misses on the same never-seen content collapse into one
    /// provider call; late arrivals observe the stored entry. A provider
    /// failure stores nothing, so a retried identical request attempts the
    /// call again.
    pub async fn lookup_or_compute(&self, content: &str) -> Result<String> {
        let key = Self::content_key(content);

        if let Some(entry) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %&key[..8], "explanation cache hit");
            return Ok(entry.clone());
        }

        // Serialize concurrent misses per key so the provider is invoked at
        // most once per distinct content hash.
        let gate = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = gate.lock().await;

        // Another request may have filled the entry while we waited.
        if let Some(entry) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %&key[..8], "explanation cache hit after waiting on in-flight call");
            return Ok(entry.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let prompt = format!("{EXPLAIN_PROMPT_PREFIX}{content}");

        match self.provider.complete(&prompt).await {
            Ok(explanation) => {
                // First writer wins; an existing entry is never overwritten.
                self.entries
                    .entry(key.clone())
                    .or_insert_with(|| explanation.clone());
                self.in_flight.remove(&key);
                debug!(key = %&key[..8], "cached new explanation");
                Ok(explanation)
            }
            Err(e) => {
                // Nothing is cached on failure; drop the gate so the next
                // identical upload retries the provider.
                self.in_flight.remove(&key);
                Err(e)
            }
        }
    }

    /// Aggregate counters for the health endpoint.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of distinct content hashes currently cached.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if no explanation has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Aggregate cache statistics.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    /// Number of entries currently in the cache.
    pub entries: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that invoked the provider.
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExplainError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    /// Scripted provider that counts calls and can be told to fail.
    struct FakeProvider {
        calls: AtomicUsize,
        fail: AtomicBool,
        delay: Option<Duration>,
    }

    impl FakeProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                delay: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionProvider for FakeProvider {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(ExplainError::Provider("scripted failure".into()));
            }
            Ok(format!("explained: {}", prompt.len()))
        }

        fn model(&self) -> &str {
            "fake-model"
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn cache_with(provider: Arc<FakeProvider>) -> ExplanationCache {
        ExplanationCache::new(provider)
    }

    #[test]
    fn test_content_key_deterministic() {
        let k1 = ExplanationCache::content_key("print(\"hi\")");
        let k2 = ExplanationCache::content_key("print(\"hi\")");
        assert_eq!(k1, k2);
        assert_eq!(k1.len(), 64, "hex SHA-256 digest is 64 chars");
    }

    #[test]
    fn test_content_key_distinct_for_distinct_content() {
        let k1 = ExplanationCache::content_key("print(1)");
        let k2 = ExplanationCache::content_key("print(2)");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_content_key_known_digest() {
        // sha256("") — pins the digest function and encoding.
        assert_eq!(
            ExplanationCache::content_key(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let provider = Arc::new(FakeProvider::new());
        let cache = cache_with(provider.clone());

        let first = cache.lookup_or_compute("print(1)").await.unwrap();
        let second = cache.lookup_or_compute("print(1)").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1, "provider invoked once per distinct content");
    }

    #[tokio::test]
    async fn test_distinct_content_computed_separately() {
        let provider = Arc::new(FakeProvider::new());
        let cache = cache_with(provider.clone());

        let _ = cache.lookup_or_compute("print(1)").await.unwrap();
        let _ = cache.lookup_or_compute("print(22)").await.unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached_and_retried() {
        let provider = Arc::new(FakeProvider::new());
        provider.fail.store(true, Ordering::SeqCst);
        let cache = cache_with(provider.clone());

        let err = cache.lookup_or_compute("print(1)").await;
        assert!(matches!(err, Err(ExplainError::Provider(_))));
        assert!(cache.is_empty(), "failed attempt must leave no entry");

        provider.fail.store(false, Ordering::SeqCst);
        let ok = cache.lookup_or_compute("print(1)").await.unwrap();
        assert!(!ok.is_empty());
        assert_eq!(provider.calls(), 2, "retry after failure reaches the provider");
    }

    #[tokio::test]
    async fn test_concurrent_misses_collapse_into_one_call() {
        let provider = Arc::new(FakeProvider {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay: Some(Duration::from_millis(50)),
        });
        let cache = Arc::new(cache_with(provider.clone()));

        let (a, b) = tokio::join!(
            {
                let cache = cache.clone();
                async move { cache.lookup_or_compute("print(1)").await }
            },
            {
                let cache = cache.clone();
                async move { cache.lookup_or_compute("print(1)").await }
            }
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(provider.calls(), 1, "single-flight must collapse concurrent misses");
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let provider = Arc::new(FakeProvider::new());
        let cache = cache_with(provider);

        let _ = cache.lookup_or_compute("a").await.unwrap();
        let _ = cache.lookup_or_compute("a").await.unwrap();
        let _ = cache.lookup_or_compute("b").await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[tokio::test]
    async fn test_prompt_embeds_content_after_fixed_prefix() {
        // FakeProvider echoes the prompt length; verify the prefix is applied.
        let provider = Arc::new(FakeProvider::new());
        let cache = cache_with(provider);
        let content = "print(\"hi\")";
        let explanation = cache.lookup_or_compute(content).await.unwrap();
        let expected_len = EXPLAIN_PROMPT_PREFIX.len() + content.len();
        assert_eq!(explanation, format!("explained: {expected_len}"));
    }
}
