//! TTL Cleanup Task
//!
//! Background task that periodically expunges expired local-tier entries.
//! The remote tier manages its own expiration and is never touched.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backend::{CacheBackend, RemoteBackend};
use crate::tiered::TieredCache;

/// Spawns a background task that periodically runs the coordinator's
/// local-tier cleanup.
///
/// The task loops forever, sleeping for the given interval between sweeps.
/// Abort the returned handle during shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(TieredCache::new(remote, local));
/// let handle = spawn_cleanup_task(cache.clone(), 1);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task<R, L>(
    cache: Arc<TieredCache<R, L>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()>
where
    R: RemoteBackend + 'static,
    L: CacheBackend + 'static,
{
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup().await;

            if removed > 0 {
                info!("TTL cleanup: removed {} expired local entries", removed);
            } else {
                debug!("TTL cleanup: no expired local entries found");
            }
        }
    })
}
