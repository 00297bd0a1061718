//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries out of a
//! [`BoundedTtlCache`].

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::BoundedTtlCache;
use crate::clock::Clock;

/// Spawns a background task that periodically removes expired cache entries.
///
/// Expired entries are already invisible to readers; the sweep only gives
/// their memory back early instead of waiting for the next prune or lookup.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(BoundedTtlCache::<u32>::new(1000, 100, Duration::from_secs(60)));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(30));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<T, C>(
    cache: Arc<BoundedTtlCache<T, C>>,
    interval: Duration,
) -> JoinHandle<()>
where
    T: Send + 'static,
    C: Clock,
{
    tokio::spawn(async move {
        info!(?interval, "Starting TTL cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired();
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
