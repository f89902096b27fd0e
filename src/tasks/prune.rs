//! Cache Prune Task
//!
//! Background task that periodically sweeps expired cache entries.
//!
//! The cache core itself enforces expiry lazily on read and never runs a
//! timer; this task is the gateway's proactive caller of `prune` for
//! memory reclamation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::TtlLruCache;

/// Spawns a background task that periodically prunes expired cache entries.
///
/// The task sleeps for the given interval between sweeps, taking the write
/// lock only for the sweep itself.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `prune_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_prune_task<V>(
    cache: Arc<RwLock<TtlLruCache<V>>>,
    prune_interval_secs: u64,
) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    let interval = Duration::from_secs(prune_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting cache prune task with interval of {} seconds",
            prune_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.prune()
            };

            if removed > 0 {
                info!("Cache prune: removed {} expired entries", removed);
            } else {
                debug!("Cache prune: no expired entries found");
            }
        }
    })
}
