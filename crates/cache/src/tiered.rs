//! The two-tier cache facade.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::local::LocalTier;
use crate::store::SharedStore;

/// Tuning knobs, built once at startup and passed in (no process globals).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied to local-tier entries repopulated from a shared-tier hit.
    /// Kept short: it bounds how long this instance can serve a value a peer
    /// has already invalidated.
    pub local_populate_ttl: Duration,
    /// Interval for the background sweep of the local tier.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            local_populate_ttl: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

/// Two-tier cache: local in-process tier in front of a shared store.
///
/// Values are a typed serde contract per call site; everything crosses the
/// tiers as serialized JSON bytes. No operation here returns an error —
/// shared-tier and serialization failures are logged and degrade to a
/// miss/no-op, with the system of record as the fallback.
pub struct TieredCache {
    local: LocalTier,
    shared: Arc<dyn SharedStore>,
    config: CacheConfig,
}

impl TieredCache {
    pub fn new(shared: Arc<dyn SharedStore>) -> Self {
        Self::with_config(shared, CacheConfig::default())
    }

    pub fn with_config(shared: Arc<dyn SharedStore>, config: CacheConfig) -> Self {
        Self {
            local: LocalTier::default(),
            shared,
            config,
        }
    }

    /// Local tier first (lazy expiry check), then the shared tier. A shared
    /// hit repopulates the local tier with a short TTL.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        if let Some(bytes) = self.local.get(key) {
            match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    debug!(key, tier = "local", "cache hit");
                    return Some(value);
                }
                Err(e) => {
                    warn!(key, error = %e, "undecodable local cache entry; evicting");
                    self.local.remove(key);
                }
            }
        }

        match self.shared.get(key) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    debug!(key, tier = "shared", "cache hit");
                    self.local
                        .set(key, bytes, expiry_from_ttl(self.config.local_populate_ttl));
                    Some(value)
                }
                Err(e) => {
                    warn!(key, error = %e, "undecodable shared cache entry; treating as miss");
                    None
                }
            },
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key, error = %e, "shared cache read failed; treating as miss");
                None
            }
        }
    }

    /// Write-through to both tiers. `ttl == Duration::ZERO` means no expiry.
    pub fn set<T>(&self, key: &str, value: &T, ttl: Duration)
    where
        T: Serialize,
    {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize cache value; skipping");
                return;
            }
        };

        self.local.set(key, bytes.clone(), expiry_from_ttl(ttl));

        let shared_ttl = (!ttl.is_zero()).then_some(ttl);
        if let Err(e) = self.shared.set(key, &bytes, shared_ttl) {
            warn!(key, error = %e, "shared cache write failed; local tier only");
        }
    }

    /// Remove the entry from both tiers **on this instance**.
    ///
    /// Peer instances' local tiers are not notified and may serve a stale
    /// value until their own TTL lapses; callers needing a strict bound on
    /// cross-instance staleness rely on a short TTL.
    pub fn delete(&self, key: &str) {
        if self.local.remove(key) {
            debug!(key, "local cache entry deleted");
        }
        if let Err(e) = self.shared.delete(key) {
            warn!(key, error = %e, "shared cache delete failed");
        }
    }

    /// Proactively evict expired local entries. Hygiene pass only — the lazy
    /// check in `get` is the correctness mechanism.
    pub fn sweep_expired(&self) -> usize {
        self.local.sweep(Utc::now())
    }

    pub(crate) fn sweep_interval(&self) -> Duration {
        self.config.sweep_interval
    }

    /// Number of entries currently in the local tier (including not-yet-swept
    /// expired ones).
    pub fn local_len(&self) -> usize {
        self.local.len()
    }
}

impl core::fmt::Debug for TieredCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TieredCache")
            .field("local_len", &self.local.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn expiry_from_ttl(ttl: Duration) -> Option<DateTime<Utc>> {
    if ttl.is_zero() {
        return None;
    }
    chrono::Duration::from_std(ttl).ok().map(|d| Utc::now() + d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::store::InMemorySharedStore;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        name: String,
        price: u64,
    }

    fn widget() -> Widget {
        Widget {
            name: "Widget".to_string(),
            price: 10,
        }
    }

    fn cache() -> (Arc<InMemorySharedStore>, TieredCache) {
        let store = Arc::new(InMemorySharedStore::new());
        let cache = TieredCache::new(store.clone());
        (store, cache)
    }

    #[test]
    fn set_then_get_round_trips() {
        let (_, cache) = cache();
        cache.set("k", &widget(), Duration::from_secs(60));
        assert_eq!(cache.get::<Widget>("k"), Some(widget()));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let (_, cache) = cache();
        cache.set("k", &widget(), Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get::<Widget>("k"), None);
    }

    #[test]
    fn zero_ttl_means_no_expiry() {
        let (_, cache) = cache();
        cache.set("k", &widget(), Duration::ZERO);
        assert_eq!(cache.get::<Widget>("k"), Some(widget()));
        assert_eq!(cache.sweep_expired(), 0);
    }

    #[test]
    fn delete_clears_both_tiers() {
        let (store, cache) = cache();
        cache.set("k", &widget(), Duration::ZERO);
        cache.delete("k");

        assert_eq!(cache.get::<Widget>("k"), None);
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn local_miss_falls_through_to_shared_and_repopulates() {
        let (store, cache) = cache();
        // Value present only in the shared tier, as if written by a peer.
        store
            .set("k", &serde_json::to_vec(&widget()).unwrap(), None)
            .unwrap();

        assert_eq!(cache.local_len(), 0);
        assert_eq!(cache.get::<Widget>("k"), Some(widget()));
        assert_eq!(cache.local_len(), 1);
    }

    #[derive(Debug)]
    struct FailingStore;

    impl SharedStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }

        fn set(&self, _key: &str, _value: &[u8], _ttl: Option<Duration>) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }

        fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }
    }

    #[test]
    fn shared_tier_failure_never_fails_the_caller() {
        let cache = TieredCache::new(Arc::new(FailingStore));

        // set succeeds locally even though the shared write fails.
        cache.set("k", &widget(), Duration::from_secs(60));
        assert_eq!(cache.get::<Widget>("k"), Some(widget()));

        // delete clears the local tier despite the shared failure.
        cache.delete("k");
        // ...and the follow-up read degrades to a plain miss.
        assert_eq!(cache.get::<Widget>("k"), None);
    }

    #[test]
    fn undecodable_shared_value_is_a_miss() {
        let (store, cache) = cache();
        store.set("k", b"not json", None).unwrap();
        assert_eq!(cache.get::<Widget>("k"), None);
    }
}
