//! In-process memoize-with-expiry cache for setting values.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// How long a cached setting stays fresh by default.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// Thread-safe TTL cache keyed by setting slug.
///
/// No cross-process invalidation: another process may serve a stale value
/// for up to one TTL after a write.
pub struct SettingsCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl Default for SettingsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get a fresh cached value.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Return the cached value for `key`, or run `producer` and cache what it
    /// yields for `ttl`. A `None` from the producer is not cached.
    pub async fn remember<F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Option<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<Value>>,
    {
        if let Some(value) = self.get(key).await {
            return Some(value);
        }

        let value = producer().await?;
        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Some(value)
    }

    /// Drop one entry.
    pub async fn forget(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Drop every entry.
    pub async fn flush(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_remember_runs_producer_once() {
        let cache = SettingsCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .remember("paginate_items", DEFAULT_TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Some(json!(10))
                })
                .await;
            assert_eq!(value, Some(json!(10)));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_is_not_cached() {
        let cache = SettingsCache::new();

        let value = cache.remember("missing", DEFAULT_TTL, || async { None }).await;
        assert!(value.is_none());
        assert!(cache.get("missing").await.is_none());

        let value = cache
            .remember("missing", DEFAULT_TTL, || async { Some(json!("now here")) })
            .await;
        assert_eq!(value, Some(json!("now here")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = SettingsCache::new();
        cache
            .remember("queue_emails", Duration::from_secs(60), || async { Some(json!(false)) })
            .await;
        assert!(cache.get("queue_emails").await.is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("queue_emails").await.is_none());
    }

    #[tokio::test]
    async fn test_forget_and_flush() {
        let cache = SettingsCache::new();
        for key in ["a", "b"] {
            cache.remember(key, DEFAULT_TTL, || async { Some(json!(1)) }).await;
        }

        cache.forget("a").await;
        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_some());

        cache.flush().await;
        assert!(cache.get("b").await.is_none());
    }
}
