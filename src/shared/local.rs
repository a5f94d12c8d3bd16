//! In-Process Shared Cache Fallback
//!
//! Implements the shared-tier contract over a second, disjoint entry store.
//! Used when no Redis connection is configured, so callers get identical
//! semantics whether or not an external cache exists — values are still
//! serialized text, hash-field storage still works, only the process boundary
//! differs.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::CacheStore;
use crate::error::Result;
use crate::shared::{glob_match, SharedCache};

// == In-Process Shared Cache ==
/// Shared-tier fallback holding its own [`CacheStore`] instance.
///
/// The store is exclusively owned here and never shared with the simple
/// tier.
#[derive(Debug, Default)]
pub struct InProcessSharedCache {
    store: RwLock<CacheStore>,
}

impl InProcessSharedCache {
    // == Constructor ==
    /// Creates an empty in-process shared cache.
    pub fn new() -> Self {
        Self {
            store: RwLock::new(CacheStore::new()),
        }
    }
}

#[async_trait]
impl SharedCache for InProcessSharedCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self.store.write().await.get(key);
        Ok(value.and_then(|v| v.as_str().map(str::to_owned)))
    }

    async fn set_raw(&self, key: &str, payload: &str, ttl: i64) -> Result<()> {
        self.store
            .write()
            .await
            .set(key, Value::from(payload), ttl);
        Ok(())
    }

    async fn add_raw(&self, key: &str, payload: &str, ttl: i64) -> Result<String> {
        let value = self.store.write().await.add(key, Value::from(payload), ttl);
        Ok(value
            .as_str()
            .map(str::to_owned)
            .unwrap_or_else(|| value.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.write().await.delete(key);
        Ok(())
    }

    async fn incr(&self, key: &str, delta: i64) -> Result<Option<i64>> {
        Ok(self.store.write().await.incr(key, delta))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let keys = self.store.read().await.keys();
        Ok(keys
            .into_iter()
            .filter(|key| glob_match(pattern, key))
            .collect())
    }

    async fn hash_get_multi(&self, hash: &str, fields: &[String]) -> Result<Vec<Option<String>>> {
        let mut store = self.store.write().await;
        let map = match store.get(hash) {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        Ok(fields
            .iter()
            .map(|field| map.get(field).and_then(|v| v.as_str().map(str::to_owned)))
            .collect())
    }

    async fn hash_set_multi(&self, hash: &str, entries: &[(String, String)]) -> Result<()> {
        let mut store = self.store.write().await;
        let mut map = match store.get(hash) {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        for (field, payload) in entries {
            map.insert(field.clone(), Value::from(payload.as_str()));
        }
        // The hash carries no TTL
        store.set(hash, Value::Object(map), 0);
        Ok(())
    }

    async fn flush_all(&self) -> Result<()> {
        self.store.write().await.flush_all();
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_raw_roundtrip() {
        let cache = InProcessSharedCache::new();

        cache.set_raw("key1", "payload", 0).await.unwrap();
        assert_eq!(
            cache.get_raw("key1").await.unwrap(),
            Some("payload".to_string())
        );
        assert_eq!(cache.get_raw("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_raw_ttl_expiry() {
        let cache = InProcessSharedCache::new();

        cache.set_raw("key1", "payload", 1).await.unwrap();
        assert!(cache.get_raw("key1").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(cache.get_raw("key1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_add_raw_first_writer_wins() {
        let cache = InProcessSharedCache::new();

        let first = cache.add_raw("key1", "v1", 0).await.unwrap();
        let second = cache.add_raw("key1", "v2", 0).await.unwrap();

        assert_eq!(first, "v1");
        assert_eq!(second, "v1");
    }

    #[tokio::test]
    async fn test_incr_decr() {
        let cache = InProcessSharedCache::new();

        assert_eq!(cache.incr("counter", 1).await.unwrap(), None);

        cache.set_raw("counter", "10", 0).await.unwrap();
        assert_eq!(cache.incr("counter", 5).await.unwrap(), Some(15));
        assert_eq!(cache.decr("counter", 3).await.unwrap(), Some(12));
    }

    #[tokio::test]
    async fn test_keys_pattern() {
        let cache = InProcessSharedCache::new();

        cache.set_raw("user:1", "a", 0).await.unwrap();
        cache.set_raw("user:2", "b", 0).await.unwrap();
        cache.set_raw("session:1", "c", 0).await.unwrap();

        let mut keys = cache.keys("user:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["user:1".to_string(), "user:2".to_string()]);
    }

    #[tokio::test]
    async fn test_hash_fields_roundtrip() {
        let cache = InProcessSharedCache::new();

        cache
            .hash_set_multi(
                "people",
                &[
                    ("1".to_string(), "alice".to_string()),
                    ("2".to_string(), "bob".to_string()),
                ],
            )
            .await
            .unwrap();

        let fields = vec!["1".to_string(), "3".to_string(), "2".to_string()];
        let values = cache.hash_get_multi("people", &fields).await.unwrap();
        assert_eq!(
            values,
            vec![Some("alice".to_string()), None, Some("bob".to_string())]
        );
    }

    #[tokio::test]
    async fn test_hash_set_multi_merges_fields() {
        let cache = InProcessSharedCache::new();

        cache
            .hash_set_multi("people", &[("1".to_string(), "alice".to_string())])
            .await
            .unwrap();
        cache
            .hash_set_multi("people", &[("2".to_string(), "bob".to_string())])
            .await
            .unwrap();

        let fields = vec!["1".to_string(), "2".to_string()];
        let values = cache.hash_get_multi("people", &fields).await.unwrap();
        assert_eq!(
            values,
            vec![Some("alice".to_string()), Some("bob".to_string())]
        );
    }

    #[tokio::test]
    async fn test_flush_all() {
        let cache = InProcessSharedCache::new();

        cache.set_raw("a", "1", 0).await.unwrap();
        cache.flush_all().await.unwrap();
        assert_eq!(cache.get_raw("a").await.unwrap(), None);
    }
}
