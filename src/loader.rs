//! Batch Cache-Aside Loader Module
//!
//! Given a set of entity identifiers, returns as many values as possible
//! from a cache tier and backfills the rest from a supplied data-query
//! capability, writing the backfilled values into the cache before
//! returning.
//!
//! Two variants share the algorithm but differ in tier and key scheme:
//! [`get_simple_cache_list`] stores one key per entity in the simple tier;
//! [`get_cache_list`] stores every entity as a field of a single hash in the
//! shared tier, trading independent per-entity TTLs for fewer round-trips.
//!
//! For both: an id present in the request but absent from both cache and
//! source is silently dropped from the result — callers must not assume the
//! result covers every requested id.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::warn;

use crate::cache::CacheStore;
use crate::error::Result;
use crate::shared::SharedCache;

// == Cache Entity ==
/// A value that can travel through the batch loaders: serializable, and
/// exposing a stable identifier.
pub trait CacheEntity: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Identifier type; folded into cache keys via its string form.
    type Id: ToString + Eq + Hash + Clone + Send + Sync;

    /// The entity's stable identifier.
    fn id(&self) -> Self::Id;
}

// == Entity Source ==
/// The only contract the loaders require from the storage layer: fetch all
/// entities whose id is in a given set. How that query executes is the
/// source's business.
#[async_trait]
pub trait EntitySource<E: CacheEntity>: Send + Sync {
    /// Fetches every entity whose id is in `ids`. Ids with no backing entity
    /// are simply not returned.
    async fn fetch_by_ids(&self, ids: &HashSet<E::Id>) -> Result<Vec<E>>;
}

// == Simple-Tier Batch Loader ==
/// Cache-aside loading against the simple tier, one key per entity under
/// `namespace + key_prefix + id`.
///
/// Reads the tier for every deduplicated id, queries `source` for exactly
/// the missing ones, writes the backfill into the same composed key space,
/// and returns the merged `id -> entity` mapping.
pub async fn get_simple_cache_list<E, S>(
    source: &S,
    store: &Arc<RwLock<CacheStore>>,
    id_list: &[E::Id],
    key_prefix: &str,
    ttl: i64,
    namespace: &str,
) -> Result<HashMap<E::Id, E>>
where
    E: CacheEntity,
    S: EntitySource<E>,
{
    if id_list.is_empty() {
        return Ok(HashMap::new());
    }

    let id_by_key: HashMap<String, E::Id> = id_list
        .iter()
        .map(|id| (id.to_string(), id.clone()))
        .collect();
    let prefix = format!("{}{}", namespace, key_prefix);

    let cached = {
        let mut store = store.write().await;
        store.get_multi(id_by_key.keys(), &prefix)
    };

    let mut result: HashMap<E::Id, E> = HashMap::new();
    for (key, value) in cached {
        if let Some(id) = id_by_key.get(&key) {
            result.insert(id.clone(), serde_json::from_value(value)?);
        }
    }

    let missing: HashSet<E::Id> = id_by_key
        .values()
        .filter(|id| !result.contains_key(id))
        .cloned()
        .collect();

    if !missing.is_empty() {
        let fetched = source.fetch_by_ids(&missing).await?;

        let mut backfill: HashMap<String, Value> = HashMap::new();
        for entity in fetched {
            let id = entity.id();
            backfill.insert(id.to_string(), serde_json::to_value(&entity)?);
            result.insert(id, entity);
        }

        if !backfill.is_empty() {
            store.write().await.set_multi(&backfill, ttl, &prefix);
        }
    }

    Ok(result)
}

// == Shared-Tier Batch Loader ==
/// Cache-aside loading against the shared tier's hash-field storage: every
/// entity lives as a field of the hash named `namespace + key_hash`.
///
/// A read-side backend fault is treated as a total miss (the source still
/// answers); write-back and serialization faults propagate. The hash carries
/// no TTL.
pub async fn get_cache_list<E, S>(
    source: &S,
    shared: &Arc<dyn SharedCache>,
    id_list: &[E::Id],
    key_hash: &str,
    namespace: &str,
) -> Result<HashMap<E::Id, E>>
where
    E: CacheEntity,
    S: EntitySource<E>,
{
    if id_list.is_empty() {
        return Ok(HashMap::new());
    }

    let id_by_field: HashMap<String, E::Id> = id_list
        .iter()
        .map(|id| (id.to_string(), id.clone()))
        .collect();
    let fields: Vec<String> = id_by_field.keys().cloned().collect();
    let hash = format!("{}{}", namespace, key_hash);

    let payloads = match shared.hash_get_multi(&hash, &fields).await {
        Ok(payloads) => payloads,
        Err(err) => {
            warn!(hash = %hash, error = %err, "hash read failed, falling through to source");
            vec![None; fields.len()]
        }
    };

    let mut result: HashMap<E::Id, E> = HashMap::new();
    for (field, payload) in fields.iter().zip(payloads) {
        if let Some(payload) = payload {
            let entity: E = serde_json::from_str(&payload)?;
            if let Some(id) = id_by_field.get(field) {
                result.insert(id.clone(), entity);
            }
        }
    }

    let missing: HashSet<E::Id> = id_by_field
        .values()
        .filter(|id| !result.contains_key(id))
        .cloned()
        .collect();

    if !missing.is_empty() {
        let fetched = source.fetch_by_ids(&missing).await?;

        let mut backfill: Vec<(String, String)> = Vec::new();
        for entity in fetched {
            let id = entity.id();
            backfill.push((id.to_string(), serde_json::to_string(&entity)?));
            result.insert(id, entity);
        }

        if !backfill.is_empty() {
            shared.hash_set_multi(&hash, &backfill).await?;
        }
    }

    Ok(result)
}
