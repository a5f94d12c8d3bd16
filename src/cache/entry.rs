//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry with value and expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Insertion timestamp (Unix milliseconds)
    pub inserted_at: u64,
    /// TTL in seconds; 0 means the entry never expires
    pub ttl_seconds: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// A negative TTL is normalized to 0 (never expires) on write.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - TTL in seconds; 0 or negative means no expiry
    pub fn new(value: Value, ttl: i64) -> Self {
        Self {
            value,
            inserted_at: current_timestamp_ms(),
            ttl_seconds: normalize_ttl(ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry with a nonzero TTL is expired once the current time is past
    /// `inserted_at + ttl_seconds`. Entries with TTL 0 never expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading (Unix milliseconds).
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.ttl_seconds > 0 && now_ms > self.inserted_at + self.ttl_seconds * 1000
    }
}

// == Utility Functions ==
/// Clamps a caller-supplied TTL to the stored form: negatives become 0.
pub fn normalize_ttl(ttl: i64) -> u64 {
    ttl.max(0) as u64
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new(json!("test_value"), 0);

        assert_eq!(entry.value, json!("test_value"));
        assert_eq!(entry.ttl_seconds, 0);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_negative_ttl_normalized() {
        let entry = CacheEntry::new(json!(1), -30);

        assert_eq!(entry.ttl_seconds, 0);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new(json!({"a": 1}), 60);

        assert_eq!(entry.ttl_seconds, 60);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        // Create entry with 1 second TTL
        let entry = CacheEntry::new(json!("test_value"), 1);

        assert!(!entry.is_expired());

        // Wait for expiration
        sleep(Duration::from_millis(1100));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary() {
        let now = current_timestamp_ms();
        let entry = CacheEntry {
            value: json!("test"),
            inserted_at: now,
            ttl_seconds: 10,
        };

        // Alive at and before the deadline, expired strictly past it
        assert!(!entry.is_expired_at(now + 10_000));
        assert!(entry.is_expired_at(now + 10_001));
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let now = current_timestamp_ms();
        let entry = CacheEntry {
            value: json!("test"),
            inserted_at: now,
            ttl_seconds: 0,
        };

        // Far-future clock readings still report the entry alive
        assert!(!entry.is_expired_at(now + 1_000_000_000));
    }
}
