//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from the simple
//! tier. Expiry stays lazily enforced on every read regardless; the sweep
//! only reclaims memory for entries nobody reads again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task loops forever, sleeping for the configured interval between
/// sweeps and taking a write lock on the store for each one. The returned
/// handle can be used to abort the task during shutdown.
///
/// # Arguments
/// * `store` - Shared handle to the simple-tier store
/// * `interval_secs` - Seconds between sweeps
pub fn spawn_cleanup_task(
    store: Arc<RwLock<CacheStore>>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(interval_secs, "expiry sweep task started");

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut store = store.write().await;
                store.cleanup_expired()
            };

            if removed > 0 {
                info!(removed, "expiry sweep removed entries");
            } else {
                debug!("expiry sweep found nothing to remove");
            }
        }
    })
}
