//! Cache Store Module
//!
//! The in-process entry store exposing a memcached-like protocol: get/set/add/
//! delete/incr/decr plus multi-key batch variants. Expiry is lazy: expired
//! entries are detected and removed on the next read.

use std::collections::HashMap;

use serde_json::Value;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats};

// == Cache Store ==
/// In-process key-value store with per-entry TTL and lazy expiry.
///
/// A miss is not an error: reads report absence with `None` or by omitting
/// the key from the returned mapping. Values are stored as
/// [`serde_json::Value`], so anything that crosses the store is serializable
/// by construction.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new empty CacheStore.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
        }
    }

    /// Removes the entry if present and expired, then returns a clone of the
    /// live value. Does not touch hit/miss counters.
    fn live_value(&mut self, key: &str) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            self.stats.record_expiration();
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Performs the lazy-expiry check: an expired entry is physically removed
    /// and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        match self.live_value(key) {
            Some(value) => {
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores a key-value pair, overwriting unconditionally.
    ///
    /// A negative TTL is clamped to 0 (never expires). Returns the stored
    /// value.
    pub fn set(&mut self, key: &str, value: Value, ttl: i64) -> Value {
        let entry = CacheEntry::new(value.clone(), ttl);
        self.entries.insert(key.to_string(), entry);
        value
    }

    // == Add ==
    /// Insert-if-absent: if a live entry exists under `key`, returns the
    /// existing value unchanged; otherwise behaves as [`CacheStore::set`].
    pub fn add(&mut self, key: &str, value: Value, ttl: i64) -> Value {
        if let Some(existing) = self.live_value(key) {
            return existing;
        }
        self.set(key, value, ttl)
    }

    // == Delete ==
    /// Removes an entry by key. Idempotent: missing keys are not an error.
    pub fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    // == Incr ==
    /// Adds `delta` to the numeric value stored under `key`.
    ///
    /// Returns the new value, or `None` when the key is missing, expired, or
    /// does not hold a numeric value. A numeric-looking string is coerced to
    /// an integer before the addition and stored back as an integer. The
    /// entry's TTL and insertion time are left untouched, and an absent key is
    /// never created.
    pub fn incr(&mut self, key: &str, delta: i64) -> Option<i64> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };
        if expired {
            self.entries.remove(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        let current = numeric_value(&entry.value)?;
        let next = current + delta;
        entry.value = Value::from(next);
        self.stats.record_hit();
        Some(next)
    }

    // == Decr ==
    /// [`CacheStore::incr`] with a negated delta.
    pub fn decr(&mut self, key: &str, delta: i64) -> Option<i64> {
        self.incr(key, -delta)
    }

    // == Set Multi ==
    /// Applies [`CacheStore::set`] to every `(prefix + key, value)` pair.
    ///
    /// Every key is attempted; there is no partial-failure signal.
    pub fn set_multi(&mut self, mapping: &HashMap<String, Value>, ttl: i64, key_prefix: &str) {
        for (key, value) in mapping {
            self.set(&format!("{}{}", key_prefix, key), value.clone(), ttl);
        }
    }

    // == Get Multi ==
    /// Retrieves every `prefix + key`, returning only the keys found.
    ///
    /// The returned mapping is keyed by the unprefixed name; absent keys are
    /// silently omitted.
    pub fn get_multi<I, K>(&mut self, keys: I, key_prefix: &str) -> HashMap<String, Value>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut found = HashMap::new();
        for key in keys {
            let key = key.as_ref();
            if let Some(value) = self.get(&format!("{}{}", key_prefix, key)) {
                found.insert(key.to_string(), value);
            }
        }
        found
    }

    // == Delete Multi ==
    /// Deletes every `prefix + key`. Best-effort: missing keys are skipped
    /// silently.
    pub fn delete_multi<I, K>(&mut self, keys: I, key_prefix: &str)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        for key in keys {
            self.delete(&format!("{}{}", key_prefix, key.as_ref()));
        }
    }

    // == Flush All ==
    /// Clears every entry. Used for test isolation; there is no production
    /// safety guard.
    pub fn flush_all(&mut self) {
        self.entries.clear();
    }

    // == Keys ==
    /// Returns every non-expired key. Read-only: expired entries are skipped
    /// but not removed here.
    pub fn keys(&self) -> Vec<String> {
        let now = current_timestamp_ms();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
            self.stats.record_expiration();
        }

        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn insert_raw_entry(&mut self, key: &str, entry: CacheEntry) {
        self.entries.insert(key.to_string(), entry);
    }

    #[cfg(test)]
    pub(crate) fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }
}

/// Integer view of a stored value: integers pass through, numeric-looking
/// strings are coerced.
fn numeric_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}
