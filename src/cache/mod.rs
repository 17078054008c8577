//! Two-tier TTL cache
//!
//! Lookups consult the shared tier first, then the process-local map, and
//! only then run the loader. Loaded values are stored locally right away
//! and written to the shared tier from a detached task. The shared tier is
//! best effort: any error there is logged and treated as a miss.
//!
//! There is no cross-call coalescing here. Two concurrent misses for the
//! same key both run their loader and the later write wins.

mod key;
mod shared;

pub use key::{CacheKey, KeyPart, KEY_DELIMITER};
pub(crate) use key::cache_key;
pub use shared::{expiry_secs, RedisSharedCache, SharedCache};

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::metrics::Metrics;

/// A locally cached value and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Shared,
    Local,
}

impl Tier {
    fn as_str(&self) -> &'static str {
        match self {
            Tier::Shared => "shared",
            Tier::Local => "local",
        }
    }
}

pub struct TieredCache {
    shared: Option<Arc<dyn SharedCache>>,
    local: Mutex<HashMap<String, CacheEntry>>,
    metrics: Option<Arc<Metrics>>,
}

impl Default for TieredCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TieredCache {
    /// Local tier only.
    pub fn new() -> Self {
        Self {
            shared: None,
            local: Mutex::new(HashMap::new()),
            metrics: None,
        }
    }

    pub fn with_shared(mut self, shared: Arc<dyn SharedCache>) -> Self {
        self.shared = Some(shared);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn has_shared_tier(&self) -> bool {
        self.shared.is_some()
    }

    /// Return the cached value for `key`, or run `loader` and cache its
    /// result for `ttl`. Loader errors propagate and nothing is cached.
    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        key: impl Into<CacheKey>,
        ttl: Duration,
        loader: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = key.into().canonical();

        if let Some(value) = self.read_shared(&key).await {
            self.record(Some(Tier::Shared));
            return Ok(value);
        }

        if let Some(value) = self.read_local(&key) {
            self.record(Some(Tier::Local));
            return Ok(value);
        }

        self.record(None);
        let value = loader().await?;

        match serde_json::to_value(&value) {
            Ok(encoded) => {
                let entry = CacheEntry {
                    value: encoded.clone(),
                    expires_at: Instant::now() + ttl,
                };
                self.lock_local().insert(key.clone(), entry);
                self.spawn_shared_write(key, encoded, ttl);
            }
            Err(e) => warn!(key = %key, error = %e, "Loaded value is not cacheable"),
        }

        Ok(value)
    }

    /// Number of entries in the local tier, expired ones included.
    pub fn local_len(&self) -> usize {
        self.lock_local().len()
    }

    async fn read_shared<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let shared = self.shared.as_ref()?;
        match shared.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!(key = %key, error = %e, "Ignoring undecodable shared cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!(key = %key, error = %e, "Shared cache read failed");
                None
            }
        }
    }

    fn read_local<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let encoded = {
            let local = self.lock_local();
            let entry = local.get(key)?;
            if !entry.is_fresh(Instant::now()) {
                return None;
            }
            entry.value.clone()
        };
        serde_json::from_value(encoded).ok()
    }

    fn spawn_shared_write(&self, key: String, encoded: Value, ttl: Duration) {
        let Some(shared) = self.shared.clone() else {
            return;
        };
        let payload = encoded.to_string();
        tokio::spawn(async move {
            if let Err(e) = shared.set(&key, payload, ttl).await {
                warn!(key = %key, error = %e, "Shared cache write failed");
            }
        });
    }

    fn lock_local(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, hit: Option<Tier>) {
        if let Some(metrics) = &self.metrics {
            match hit {
                Some(tier) => metrics.record_cache_lookup(tier.as_str(), "hit"),
                None => metrics.record_cache_lookup("all", "miss"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSharedCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn load_counted(
        cache: &TieredCache,
        key: &str,
        ttl: Duration,
        calls: &AtomicUsize,
        value: u64,
    ) -> Result<u64, String> {
        cache
            .get_or_load(key, ttl, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(value)
            })
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let cache = TieredCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_millis(1_000);

        assert_eq!(load_counted(&cache, "k", ttl, &calls, 1).await.unwrap(), 1);
        tokio::time::advance(Duration::from_millis(999)).await;
        assert_eq!(load_counted(&cache, "k", ttl, &calls, 2).await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_after_ttl() {
        let cache = TieredCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_millis(1_000);

        load_counted(&cache, "k", ttl, &calls, 1).await.unwrap();
        tokio::time::advance(Duration::from_millis(1_000)).await;
        assert_eq!(load_counted(&cache, "k", ttl, &calls, 2).await.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_loader_error_is_not_cached() {
        let cache = TieredCache::new();
        let ttl = Duration::from_secs(60);

        let failed: Result<u64, String> = cache
            .get_or_load("k", ttl, || async { Err("boom".to_string()) })
            .await;
        assert_eq!(failed.unwrap_err(), "boom");
        assert_eq!(cache.local_len(), 0);

        let calls = AtomicUsize::new(0);
        assert_eq!(load_counted(&cache, "k", ttl, &calls, 7).await.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_keys_are_case_insensitive() {
        let cache = TieredCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        load_counted(&cache, "token:0xABC:gateway", ttl, &calls, 1).await.unwrap();
        load_counted(&cache, "token:0xabc:gateway", ttl, &calls, 2).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shared_hit_bypasses_loader() {
        let shared = Arc::new(MockSharedCache::new());
        shared.insert("k", "\"from-shared\"");
        let cache = TieredCache::new().with_shared(shared.clone());

        let value: String = cache
            .get_or_load("K", Duration::from_secs(60), || async {
                Err::<String, String>("loader must not run".into())
            })
            .await
            .unwrap();
        assert_eq!(value, "from-shared");
        assert_eq!(cache.local_len(), 0);
    }

    #[tokio::test]
    async fn test_shared_failure_is_absorbed() {
        let shared = Arc::new(MockSharedCache::failing());
        let cache = TieredCache::new().with_shared(shared.clone());
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        assert_eq!(load_counted(&cache, "k", ttl, &calls, 5).await.unwrap(), 5);
        // second call is served by the local tier even though the shared tier errors
        assert_eq!(load_counted(&cache, "k", ttl, &calls, 6).await.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_background_shared_write() {
        let shared = Arc::new(MockSharedCache::new());
        let cache = TieredCache::new().with_shared(shared.clone());
        let calls = AtomicUsize::new(0);

        load_counted(&cache, "Payload:1", Duration::from_millis(15_000), &calls, 42)
            .await
            .unwrap();

        for _ in 0..10 {
            if shared.stored("payload:1").is_some() {
                break;
            }
            tokio::task::yield_now().await;
        }
        let (raw, ttl) = shared.stored("payload:1").unwrap();
        assert_eq!(raw, "42");
        assert_eq!(expiry_secs(ttl), 15);
    }

    #[tokio::test]
    async fn test_concurrent_misses_each_run_loader() {
        let cache = TieredCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        let slow = |value: u64| {
            let calls = &calls;
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                Ok::<_, String>(value)
            }
        };

        let (a, b) = tokio::join!(
            cache.get_or_load("k", ttl, slow(1)),
            cache.get_or_load("k", ttl, slow(2)),
        );
        assert_eq!((a.unwrap(), b.unwrap()), (1, 2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_structured_values_round_trip_through_local_tier() {
        #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
        struct Payload {
            to: String,
            value: String,
        }

        let cache = TieredCache::new();
        let ttl = Duration::from_secs(60);
        let first: Payload = cache
            .get_or_load("p", ttl, || async {
                Ok::<_, String>(Payload {
                    to: "0xabc".into(),
                    value: "10".into(),
                })
            })
            .await
            .unwrap();
        let second: Payload = cache
            .get_or_load("p", ttl, || async { Err::<Payload, String>("unreachable".into()) })
            .await
            .unwrap();
        assert_eq!(first, second);
    }
}
