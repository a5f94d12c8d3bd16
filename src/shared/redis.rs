//! Redis Shared Cache Adapter
//!
//! Implements the shared-tier contract over a Redis server, using a
//! multiplexed async connection for efficient connection reuse.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::shared::SharedCache;

// == Redis Shared Cache ==
/// Shared-tier adapter backed by a Redis server.
pub struct RedisSharedCache {
    client: Client,
}

impl RedisSharedCache {
    // == Constructor ==
    /// Connects to Redis and verifies the connection with a PING.
    ///
    /// Any failure here is fatal to the caller: when a shared cache is
    /// configured it must actually be reachable at startup.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| CacheError::Config(format!("invalid redis url {:?}: {}", url, e)))?;

        let mut conn = client.get_multiplexed_async_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!(%pong, "redis connection verified");

        Ok(Self { client })
    }

    /// Obtains a multiplexed connection handle.
    async fn connection(&self) -> Result<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl SharedCache for RedisSharedCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_raw(&self, key: &str, payload: &str, ttl: i64) -> Result<()> {
        let mut conn = self.connection().await?;
        let ttl = ttl.max(0) as u64;
        if ttl > 0 {
            let _: () = conn.set_ex(key, payload, ttl).await?;
        } else {
            let _: () = conn.set(key, payload).await?;
        }
        Ok(())
    }

    async fn add_raw(&self, key: &str, payload: &str, ttl: i64) -> Result<String> {
        let mut conn = self.connection().await?;

        // SET NX stores only when the key is absent
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(payload).arg("NX");
        let ttl = ttl.max(0) as u64;
        if ttl > 0 {
            cmd.arg("EX").arg(ttl);
        }
        let stored: Option<String> = cmd.query_async(&mut conn).await?;
        if stored.is_some() {
            return Ok(payload.to_string());
        }

        let existing: Option<String> = conn.get(key).await?;
        Ok(existing.unwrap_or_else(|| payload.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: i64 = conn.del(key).await?;
        Ok(())
    }

    async fn incr(&self, key: &str, delta: i64) -> Result<Option<i64>> {
        let mut conn = self.connection().await?;

        // INCRBY would create the key; the contract reports absent instead
        let exists: bool = conn.exists(key).await?;
        if !exists {
            return Ok(None);
        }
        let next: i64 = conn.incr(key, delta).await?;
        Ok(Some(next))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let found: Vec<String> = conn.keys(pattern).await?;
        Ok(found)
    }

    async fn hash_get_multi(&self, hash: &str, fields: &[String]) -> Result<Vec<Option<String>>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.connection().await?;

        let mut cmd = redis::cmd("HMGET");
        cmd.arg(hash);
        for field in fields {
            cmd.arg(field);
        }
        let values: Vec<Option<String>> = cmd.query_async(&mut conn).await?;
        Ok(values)
    }

    async fn hash_set_multi(&self, hash: &str, entries: &[(String, String)]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        let _: () = conn.hset_multiple(hash, entries).await?;
        Ok(())
    }

    async fn flush_all(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "redis"
    }
}

impl std::fmt::Debug for RedisSharedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSharedCache").finish_non_exhaustive()
    }
}
