//! TTL Purge Task
//!
//! Background task that periodically removes stale cached results so memory
//! is released even when no new results are being stored.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::memo::SharedMemoizer;

/// Spawns a background task that periodically purges stale cache entries.
///
/// The task sleeps for `interval_secs` between runs and holds the memoizer
/// lock only for the duration of one purge.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let memo = Arc::new(Mutex::new(Memoizer::new(&CacheConfig::default())?));
/// let purge_handle = spawn_purge_task(memo.clone(), 60);
/// // Later, during shutdown:
/// purge_handle.abort();
/// ```
pub fn spawn_purge_task<R>(memo: SharedMemoizer<R>, interval_secs: u64) -> JoinHandle<()>
where
    R: Clone + Send + 'static,
{
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL purge task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = memo.lock().await.purge_expired();

            if removed > 0 {
                info!("TTL purge: removed {} stale entries", removed);
            } else {
                debug!("TTL purge: no stale entries found");
            }
        }
    })
}
