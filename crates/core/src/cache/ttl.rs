//! Time-to-live result cache.
//!
//! Entries expire a fixed duration after insertion. Expiry is enforced lazily
//! on read; `clear_expired` is available for callers that want to sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Stored value with its expiry instant.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory TTL cache shared between concurrent scrapes.
///
/// Cloning the cache yields another handle to the same entries. Values are
/// cloned out on read.
#[derive(Debug, Clone)]
pub struct ResultCache<V> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    ttl: Duration,
}

impl<V: Clone> ResultCache<V> {
    /// Create a cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the value stored under `key` if it has not expired.
    ///
    /// An expired entry is removed as a side effect.
    pub async fn get(&self, key: &str) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_live(Instant::now()) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                tracing::debug!("evicted expired cache entry {}", key);
                None
            }
            None => None,
        }
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub async fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry { value, expires_at: Instant::now() + self.ttl };
        self.entries.write().await.insert(key.into(), entry);
    }

    /// Remove the entry for `key` if present.
    pub async fn delete(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Remove every expired entry, returning how many were dropped.
    pub async fn clear_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until they are evicted.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_set_then_get() {
        let cache = ResultCache::new(TTL);
        cache.set("https://example.com", "page".to_string()).await;
        assert_eq!(cache.get("https://example.com").await, Some("page".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_missing() {
        let cache: ResultCache<String> = ResultCache::new(TTL);
        assert!(cache.get("nope").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_evicted_on_read() {
        let cache = ResultCache::new(TTL);
        cache.set("k", 1u32).await;

        tokio::time::advance(TTL + Duration::from_millis(1)).await;

        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_exactly_at_ttl() {
        let cache = ResultCache::new(TTL);
        cache.set("k", 1u32).await;

        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert_eq!(cache.get("k").await, Some(1));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_refreshes_expiry() {
        let cache = ResultCache::new(TTL);
        cache.set("k", 1u32).await;
        tokio::time::advance(Duration::from_secs(50)).await;
        cache.set("k", 2u32).await;
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(cache.get("k").await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete() {
        let cache = ResultCache::new(TTL);
        cache.set("k", 1u32).await;
        cache.delete("k").await;
        cache.delete("absent").await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_expired_keeps_live_entries() {
        let cache = ResultCache::new(TTL);
        cache.set("old-1", 1u32).await;
        cache.set("old-2", 2u32).await;
        tokio::time::advance(Duration::from_secs(40)).await;
        cache.set("fresh", 3u32).await;
        tokio::time::advance(Duration::from_secs(30)).await;

        let removed = cache.clear_expired().await;

        assert_eq!(removed, 2);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("fresh").await, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_entries() {
        let cache = ResultCache::new(TTL);
        let other = cache.clone();
        cache.set("k", 7u32).await;
        assert_eq!(other.get("k").await, Some(7));
    }
}
