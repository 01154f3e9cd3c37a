//! TTL cache for market data responses
//!
//! Quotes and history are cached within a run's lifetime to avoid
//! re-fetching when several sub-queries touch the same ticker. Entries
//! expire on their own; nothing is written to disk.

use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Thread-safe TTL cache keyed by "<endpoint>:<ticker>"
pub struct MarketCache {
    cache: Arc<RwLock<TimedCache<String, serde_json::Value>>>,
}

impl MarketCache {
    /// Create a new cache with the specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a value from the cache
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Insert a value into the cache
    pub async fn insert(&self, key: String, value: serde_json::Value) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Get or fetch a value using the provided fetcher function
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: String,
        fetcher: F,
    ) -> Result<serde_json::Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<serde_json::Value, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!(key = %key, "cache hit");
            return Ok(value);
        }
        tracing::debug!(key = %key, "cache miss");

        let value = fetcher().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Whether the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Clone for MarketCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_fetch_caches_the_first_result() {
        let cache = MarketCache::new(Duration::from_secs(60));

        let first: Result<_, ()> = cache
            .get_or_fetch("quote:TCS".to_string(), || async {
                Ok(serde_json::json!(1))
            })
            .await;
        assert_eq!(first.unwrap(), serde_json::json!(1));

        // The second fetcher must never run
        let second: Result<_, ()> = cache
            .get_or_fetch("quote:TCS".to_string(), || async {
                panic!("fetcher re-invoked despite cache hit")
            })
            .await;
        assert_eq!(second.unwrap(), serde_json::json!(1));
    }

    #[tokio::test]
    async fn test_fetch_errors_are_not_cached() {
        let cache = MarketCache::new(Duration::from_secs(60));

        let failed: Result<serde_json::Value, &str> = cache
            .get_or_fetch("quote:INFY".to_string(), || async { Err("offline") })
            .await;
        assert!(failed.is_err());
        assert!(cache.is_empty().await);
    }
}
