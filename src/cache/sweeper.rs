use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use super::store::ReadCache;

/// Periodically purge expired slots until the returned handle is aborted.
pub fn spawn_sweeper(cache: Arc<ReadCache>) -> JoinHandle<()> {
    let period = cache.config().sweep_interval;
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                debug!(purged, "Purged expired cache slots");
            }
        }
    })
}
