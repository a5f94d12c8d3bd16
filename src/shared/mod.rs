//! Shared Cache Module
//!
//! The distributed ("complex") cache tier. A formal trait covers the
//! operation contract — flat keys with TTL, insert-if-absent, counters,
//! key-pattern listing, and hash-field storage for the batch loader — and two
//! implementations provide it: a Redis adapter and an in-process fallback
//! over a second, disjoint entry store.
//!
//! Backend selection happens once at startup through [`connect`]: configured
//! Redis that cannot be reached is a fatal error (a configured-but-broken
//! shared cache must not masquerade as a working one), while absent
//! configuration falls back cleanly to the in-process implementation.

mod local;
mod redis;

pub use local::InProcessSharedCache;
pub use redis::RedisSharedCache;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::error::Result;

// == Shared Cache Trait ==
/// Operation contract of the shared tier.
///
/// Payloads are serialized text (JSON); a miss is `None`, never an error.
/// Both the Redis adapter and the in-process fallback implement this trait
/// explicitly, so callers never branch on backend availability.
#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Reads the payload stored under `key`.
    async fn get_raw(&self, key: &str) -> Result<Option<String>>;

    /// Stores `payload` under `key`, overwriting unconditionally. A TTL of 0
    /// or below means no expiry.
    async fn set_raw(&self, key: &str, payload: &str, ttl: i64) -> Result<()>;

    /// Insert-if-absent: returns the existing payload when a live entry is
    /// present, otherwise stores `payload` and returns it.
    async fn add_raw(&self, key: &str, payload: &str, ttl: i64) -> Result<String>;

    /// Removes `key`. Idempotent.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Adds `delta` to the numeric value under `key`. Reports `None` for an
    /// absent key and never creates one.
    async fn incr(&self, key: &str, delta: i64) -> Result<Option<i64>>;

    /// [`SharedCache::incr`] with a negated delta.
    async fn decr(&self, key: &str, delta: i64) -> Result<Option<i64>> {
        self.incr(key, -delta).await
    }

    /// Lists every key matching a glob pattern (`*` wildcards).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Reads multiple fields of the hash stored under `hash`; the result is
    /// positionally aligned with `fields`, absent fields as `None`.
    async fn hash_get_multi(&self, hash: &str, fields: &[String]) -> Result<Vec<Option<String>>>;

    /// Writes multiple field-payload pairs into the hash stored under `hash`,
    /// creating it if needed. The hash carries no TTL.
    async fn hash_set_multi(&self, hash: &str, entries: &[(String, String)]) -> Result<()>;

    /// Clears every key. Test isolation only.
    async fn flush_all(&self) -> Result<()>;

    /// Identifier of the backing implementation ("redis" or "memory").
    fn backend_name(&self) -> &str;
}

// == Backend Selection ==
/// Resolves the shared-tier backend from configuration.
///
/// With a configured Redis URL the connection is established and verified
/// here; any failure aborts startup. Without one, a fresh in-process store
/// serves as a functional stand-in.
pub async fn connect(config: &Config) -> Result<Arc<dyn SharedCache>> {
    match config.redis_url.as_deref() {
        Some(url) => {
            let backend = RedisSharedCache::connect(url).await?;
            info!(url, "shared cache connected to redis");
            Ok(Arc::new(backend))
        }
        None => {
            info!("no redis configured, shared cache using in-process fallback");
            Ok(Arc::new(InProcessSharedCache::new()))
        }
    }
}

// == Glob Matching ==
/// Matches a key against a `*`-wildcard pattern (the KEYS-style subset the
/// in-process fallback supports).
pub(crate) fn glob_match(pattern: &str, key: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == key;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    let mut rest = key;

    let first = segments[0];
    if !rest.starts_with(first) {
        return false;
    }
    rest = &rest[first.len()..];

    for segment in &segments[1..segments.len() - 1] {
        if segment.is_empty() {
            continue;
        }
        match rest.find(segment) {
            Some(idx) => rest = &rest[idx + segment.len()..],
            None => return false,
        }
    }

    let last = segments[segments.len() - 1];
    last.is_empty() || rest.ends_with(last)
}
