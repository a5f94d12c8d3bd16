//! Memoization Module
//!
//! Higher-order wrappers that turn an expensive, deterministic computation
//! into a cache-checked one, keyed by its arguments. [`LocalMemo`] works
//! against the simple (in-process) tier; [`SharedMemo`] against the shared
//! tier, serializing values on write and deserializing on read.
//!
//! There is no negative-result exclusion: a computed value that is itself
//! "empty" is cached like any other until TTL expiry or an explicit clear.
//!
//! [`SharedMemo`] additionally collapses concurrent identical computations
//! through a per-key in-flight registry, so a cold key is computed at most
//! once per process even when many callers race on it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::cache::CacheStore;
use crate::error::Result;
use crate::shared::SharedCache;

// == Key Derivation ==
/// Derives the cache key for a memoized call: `prefix` alone when there are
/// no arguments, else `prefix:arg1-arg2-...`.
///
/// Callers are responsible for choosing prefixes that do not collide across
/// unrelated cache users.
pub fn memo_key(prefix: &str, args: &[String]) -> String {
    if args.is_empty() {
        prefix.to_string()
    } else {
        format!("{}:{}", prefix, args.join("-"))
    }
}

// == Local Memoizer ==
/// Memoization over the simple tier.
#[derive(Clone)]
pub struct LocalMemo {
    store: Arc<RwLock<CacheStore>>,
}

impl LocalMemo {
    // == Constructor ==
    /// Creates a memoizer over the given store handle.
    pub fn new(store: Arc<RwLock<CacheStore>>) -> Self {
        Self { store }
    }

    // == Cached ==
    /// Returns the cached value for `(prefix, args)` if present, otherwise
    /// runs `compute`, stores the result under the derived key with `ttl`,
    /// and returns it.
    pub async fn cached<T, F, Fut>(
        &self,
        prefix: &str,
        args: &[String],
        ttl: i64,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let key = memo_key(prefix, args);

        if let Some(value) = self.store.write().await.get(&key) {
            debug!(key = %key, "cached: serving from local cache");
            return Ok(serde_json::from_value(value)?);
        }

        let computed = compute().await;
        let value = serde_json::to_value(&computed)?;
        self.store.write().await.set(&key, value, ttl);
        Ok(computed)
    }

    // == Clear ==
    /// Removes one memoized entry by its derived key.
    pub async fn clear(&self, key: &str) {
        self.store.write().await.delete(key);
    }
}

// == Shared Memoizer ==
/// Memoization over the shared tier, with serialized values and a per-key
/// in-flight registry.
#[derive(Clone)]
pub struct SharedMemo {
    cache: Arc<dyn SharedCache>,
    in_flight: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl SharedMemo {
    // == Constructor ==
    /// Creates a memoizer over the given shared-tier handle.
    pub fn new(cache: Arc<dyn SharedCache>) -> Self {
        Self {
            cache,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // == Autocached ==
    /// Returns the cached value for `(prefix, args)` if present, otherwise
    /// runs `compute` (at most once per process across concurrent callers),
    /// stores the serialized result with `ttl`, and returns it.
    ///
    /// A payload that fails to deserialize propagates as an error rather than
    /// being treated as a miss: silently recomputing would mask data
    /// corruption in the shared store.
    pub async fn autocached<T, F, Fut>(
        &self,
        prefix: &str,
        args: &[String],
        ttl: i64,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let key = memo_key(prefix, args);

        if let Some(payload) = self.cache.get_raw(&key).await? {
            debug!(key = %key, "autocached: serving from shared cache");
            return Ok(serde_json::from_str(&payload)?);
        }

        // Cold key: serialize callers through a per-key gate so only the
        // first one actually computes.
        let gate = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let result: Result<T> = async {
            let _guard = gate.lock().await;

            // A caller that held the gate before us may have stored already
            if let Some(payload) = self.cache.get_raw(&key).await? {
                debug!(key = %key, "autocached: filled while waiting");
                return Ok(serde_json::from_str(&payload)?);
            }

            let computed = compute().await;
            let payload = serde_json::to_string(&computed)?;
            self.cache.set_raw(&key, &payload, ttl).await?;
            Ok(computed)
        }
        .await;

        drop(gate);
        self.release(&key).await;
        result
    }

    /// Drops the in-flight registry entry once no caller holds it anymore.
    async fn release(&self, key: &str) {
        let mut in_flight = self.in_flight.lock().await;
        if let Some(gate) = in_flight.get(key) {
            if Arc::strong_count(gate) == 1 {
                in_flight.remove(key);
            }
        }
    }

    // == Clear ==
    /// Removes one memoized entry by its derived key.
    pub async fn clear(&self, key: &str) -> Result<()> {
        debug!(key, "autocached: clearing key");
        self.cache.delete(key).await
    }

    // == Clear Pattern ==
    /// Bulk invalidation: lists every key matching `pattern` and deletes each
    /// in turn. Scan-then-delete, not atomic.
    ///
    /// Returns the number of keys deleted.
    pub async fn clear_pattern(&self, pattern: &str) -> Result<usize> {
        let keys = self.cache.keys(pattern).await?;
        if keys.is_empty() {
            debug!(pattern, "clear_pattern: no keys matched");
            return Ok(0);
        }
        for key in &keys {
            self.cache.delete(key).await?;
        }
        debug!(pattern, count = keys.len(), "clear_pattern: keys removed");
        Ok(keys.len())
    }
}
