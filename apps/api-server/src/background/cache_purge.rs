//! Periodic eviction of expired in-memory cache entries.

use std::sync::Arc;
use std::time::Duration;

use quill_infra::InMemoryCache;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shortest accepted purge period.
const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Spawn a task that drops expired entries from `cache` every `period`.
///
/// The task runs until the returned handle is aborted or the runtime shuts down.
pub fn spawn_cache_purge(cache: Arc<InMemoryCache>, period: Duration) -> JoinHandle<()> {
    let period = period.max(MIN_PERIOD);
    tracing::info!(period_secs = period.as_secs(), "Starting cache purge task");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = cache.purge_expired().await;
            if removed > 0 {
                let remaining = cache.len().await;
                tracing::debug!(
                    removed,
                    remaining,
                    "Purged expired cache entries"
                );
            }
        }
    })
}
