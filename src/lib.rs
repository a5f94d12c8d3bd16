//! Tiercache - two-tier application caching
//!
//! A fast in-process TTL store and a shared (Redis-backed) store unified
//! behind one read/write contract, plus the two composition layers built on
//! top: memoization of expensive calls keyed by their arguments, and batch
//! cache-aside loading of entity collections that reconciles cache hits with
//! a backing data source.
//!
//! Construct a [`TieredCache`] once at process start and hand it to every
//! collaborator that needs caching:
//!
//! ```no_run
//! use tiercache::{Config, TieredCache};
//!
//! # async fn start() -> tiercache::Result<()> {
//! let config = Config::from_env();
//! let caches = TieredCache::connect(&config).await?;
//! let sweep = tiercache::spawn_cleanup_task(caches.simple().clone(), config.cleanup_interval);
//! # sweep.abort();
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod memo;
pub mod provider;
pub mod shared;
pub mod tasks;

pub use config::Config;
pub use error::{CacheError, Result};
pub use provider::TieredCache;
pub use tasks::spawn_cleanup_task;
