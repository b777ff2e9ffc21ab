//! Token estimation with digest-keyed caching
//!
//! Token counting goes through the extraction provider, which is a
//! network call; identical content (re-chunked pages, retried files)
//! shows up repeatedly within a session, so counts are cached under a
//! SHA-256 digest of the content with a TTL.

use crate::error::ExtractorError;
use docflow_domain::ExtractionProvider;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// A token count plus whether it was served from cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenEstimate {
    /// Estimated token count
    pub tokens: usize,

    /// True when the count came from the digest cache
    pub cache_hit: bool,
}

struct CacheEntry {
    tokens: usize,
    inserted_at: Instant,
}

/// Caching token estimator backed by the extraction provider
pub struct TokenEstimator {
    provider: Arc<dyn ExtractionProvider>,
    ttl: Duration,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl TokenEstimator {
    /// Create an estimator with the given cache TTL
    pub fn new(provider: Arc<dyn ExtractionProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Estimate tokens for a content blob
    ///
    /// Expired entries are evicted lazily before each lookup. Provider
    /// errors propagate uninterpreted; nothing is retried at this layer.
    pub async fn estimate(&self, content: &str) -> Result<TokenEstimate, ExtractorError> {
        let digest = content_digest(content);

        {
            let mut cache = self.cache.lock().unwrap();
            let ttl = self.ttl;
            cache.retain(|_, entry| entry.inserted_at.elapsed() <= ttl);

            if let Some(entry) = cache.get(&digest) {
                tracing::debug!("Token estimate cache hit for digest {}", &digest[..12]);
                return Ok(TokenEstimate {
                    tokens: entry.tokens,
                    cache_hit: true,
                });
            }
        }

        let tokens = self.provider.count_tokens(content).await?;

        self.cache.lock().unwrap().insert(
            digest,
            CacheEntry {
                tokens,
                inserted_at: Instant::now(),
            },
        );

        Ok(TokenEstimate {
            tokens,
            cache_hit: false,
        })
    }

    /// Remove expired entries, returning how many were evicted
    pub fn cleanup(&self) -> usize {
        let mut cache = self.cache.lock().unwrap();
        let before = cache.len();
        let ttl = self.ttl;
        cache.retain(|_, entry| entry.inserted_at.elapsed() <= ttl);
        before - cache.len()
    }

    /// Number of live cache entries
    pub fn cache_len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

/// SHA-256 hex digest of a content blob, the cache key
fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_provider::MockProvider;

    fn estimator(provider: &MockProvider, ttl: Duration) -> TokenEstimator {
        TokenEstimator::new(Arc::new(provider.clone()), ttl)
    }

    #[test]
    fn test_digest_is_stable_and_distinct() {
        assert_eq!(content_digest("abc"), content_digest("abc"));
        assert_ne!(content_digest("abc"), content_digest("abd"));
        assert_eq!(content_digest("abc").len(), 64);
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let provider = MockProvider::new();
        let estimator = estimator(&provider, Duration::from_secs(3600));

        let first = estimator.estimate("some document text").await.unwrap();
        assert!(!first.cache_hit);

        let second = estimator.estimate("some document text").await.unwrap();
        assert!(second.cache_hit);
        assert_eq!(second.tokens, first.tokens);
        assert_eq!(provider.count_call_count(), 1);
    }

    #[tokio::test]
    async fn test_distinct_content_misses() {
        let provider = MockProvider::new();
        let estimator = estimator(&provider, Duration::from_secs(3600));

        estimator.estimate("first blob").await.unwrap();
        let other = estimator.estimate("second blob").await.unwrap();

        assert!(!other.cache_hit);
        assert_eq!(provider.count_call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let provider = MockProvider::new();
        let estimator = estimator(&provider, Duration::from_secs(3600));

        estimator.estimate("aging content").await.unwrap();
        assert_eq!(estimator.cache_len(), 1);

        tokio::time::advance(Duration::from_secs(3601)).await;

        assert_eq!(estimator.cleanup(), 1);
        assert_eq!(estimator.cache_len(), 0);

        // The next lookup goes back to the provider
        let estimate = estimator.estimate("aging content").await.unwrap();
        assert!(!estimate.cache_hit);
        assert_eq!(provider.count_call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_eviction_before_lookup() {
        let provider = MockProvider::new();
        let estimator = estimator(&provider, Duration::from_secs(60));

        estimator.estimate("short lived").await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        // No explicit cleanup; the lookup itself must not see the stale entry
        let estimate = estimator.estimate("short lived").await.unwrap();
        assert!(!estimate.cache_hit);
    }
}
