//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults. The presence or absence of Redis connection settings selects the
/// shared-tier backend: when no settings are present, the shared tier falls
/// back to a second in-process store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL for the shared tier (None selects the in-process
    /// fallback)
    pub redis_url: Option<String>,
    /// Namespace prefix folded into batch-loader cache keys
    pub cache_namespace: String,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Shared-tier connection URL (default: unset)
    /// - `REDIS_HOST` / `REDIS_PORT` - Alternative host/port form, composed
    ///   into a URL when `REDIS_URL` is unset (port default: 6379)
    /// - `CACHE_NAMESPACE` - Loader key namespace prefix (default: empty)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let redis_url = env::var("REDIS_URL").ok().or_else(|| {
            let host = env::var("REDIS_HOST").ok()?;
            let port = env::var("REDIS_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(6379);
            Some(format!("redis://{}:{}", host, port))
        });

        Self {
            redis_url,
            cache_namespace: env::var("CACHE_NAMESPACE").unwrap_or_default(),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            cache_namespace: String::new(),
            cleanup_interval: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.redis_url.is_none());
        assert_eq!(config.cache_namespace, "");
        assert_eq!(config.cleanup_interval, 60);
    }

    // Environment mutation is process-wide, so both phases live in one test.
    #[test]
    fn test_config_from_env() {
        env::remove_var("REDIS_URL");
        env::remove_var("REDIS_HOST");
        env::remove_var("REDIS_PORT");
        env::remove_var("CACHE_NAMESPACE");
        env::remove_var("CLEANUP_INTERVAL");

        let config = Config::from_env();
        assert!(config.redis_url.is_none());
        assert_eq!(config.cache_namespace, "");
        assert_eq!(config.cleanup_interval, 60);

        // Host/port form composes into a URL when REDIS_URL is unset
        env::set_var("REDIS_HOST", "cache.internal");
        env::set_var("REDIS_PORT", "6380");

        let config = Config::from_env();
        assert_eq!(
            config.redis_url.as_deref(),
            Some("redis://cache.internal:6380")
        );

        env::remove_var("REDIS_HOST");
        env::remove_var("REDIS_PORT");
    }
}
