//! Cache Provider Module
//!
//! The composition root of the caching subsystem. A [`TieredCache`] is
//! constructed once at process start and passed by reference to every
//! collaborator that needs caching — there is no module-level singleton and
//! no hidden global state, so tests get fully isolated instances for free.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;
use crate::error::Result;
use crate::loader::{self, CacheEntity, EntitySource};
use crate::memo::{LocalMemo, SharedMemo};
use crate::shared::{self, SharedCache};

// == Tiered Cache ==
/// The two cache tiers plus the composition layers built on them.
///
/// - the **simple** tier: an in-process entry store;
/// - the **shared** tier: Redis when configured, otherwise a second,
///   disjoint in-process store;
/// - memoizers over each tier;
/// - batch cache-aside loaders with the configured namespace folded in.
#[derive(Clone)]
pub struct TieredCache {
    simple: Arc<RwLock<CacheStore>>,
    shared: Arc<dyn SharedCache>,
    memo: LocalMemo,
    shared_memo: SharedMemo,
    namespace: String,
}

impl TieredCache {
    // == Constructor ==
    /// Builds both tiers from configuration.
    ///
    /// Fatal when a shared cache is configured but unreachable; clean
    /// fallback when none is configured.
    pub async fn connect(config: &Config) -> Result<Self> {
        let simple = Arc::new(RwLock::new(CacheStore::new()));
        let shared = shared::connect(config).await?;

        Ok(Self {
            memo: LocalMemo::new(simple.clone()),
            shared_memo: SharedMemo::new(shared.clone()),
            simple,
            shared,
            namespace: config.cache_namespace.clone(),
        })
    }

    // == Tier Access ==
    /// Handle to the simple-tier store.
    pub fn simple(&self) -> &Arc<RwLock<CacheStore>> {
        &self.simple
    }

    /// Handle to the shared-tier client.
    pub fn shared(&self) -> &Arc<dyn SharedCache> {
        &self.shared
    }

    /// Memoizer over the simple tier.
    pub fn memo(&self) -> &LocalMemo {
        &self.memo
    }

    /// Memoizer over the shared tier.
    pub fn shared_memo(&self) -> &SharedMemo {
        &self.shared_memo
    }

    // == Batch Loaders ==
    /// [`loader::get_simple_cache_list`] with the configured namespace.
    pub async fn get_simple_cache_list<E, S>(
        &self,
        source: &S,
        id_list: &[E::Id],
        key_prefix: &str,
        ttl: i64,
    ) -> Result<HashMap<E::Id, E>>
    where
        E: CacheEntity,
        S: EntitySource<E>,
    {
        loader::get_simple_cache_list(source, &self.simple, id_list, key_prefix, ttl, &self.namespace)
            .await
    }

    /// [`loader::get_cache_list`] with the configured namespace.
    pub async fn get_cache_list<E, S>(
        &self,
        source: &S,
        id_list: &[E::Id],
        key_hash: &str,
    ) -> Result<HashMap<E::Id, E>>
    where
        E: CacheEntity,
        S: EntitySource<E>,
    {
        loader::get_cache_list(source, &self.shared, id_list, key_hash, &self.namespace).await
    }

    // == Maintenance ==
    /// Simple-tier statistics snapshot.
    pub async fn stats(&self) -> CacheStats {
        self.simple.read().await.stats()
    }

    /// Clears both tiers. Test isolation only.
    pub async fn flush_all(&self) -> Result<()> {
        self.simple.write().await.flush_all();
        self.shared.flush_all().await
    }
}

impl std::fmt::Debug for TieredCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("shared_backend", &self.shared.backend_name())
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
