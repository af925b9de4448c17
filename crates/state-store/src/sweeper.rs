//! Background eviction of abandoned logins
//!
//! `insert` already drops expired entries lazily; the sweeper additionally
//! frees memory when no new logins arrive and keeps the pending gauge fresh.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::store::CorrelationStore;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn a task that purges expired entries every `interval`.
pub fn spawn_sweeper(
    store: Arc<CorrelationStore>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately and the store is empty then
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep(&store).await;
        }
    })
}

async fn sweep(store: &CorrelationStore) {
    let purged = store.purge_expired().await;
    let pending = store.len().await;
    if purged > 0 {
        debug!(purged, pending, "swept expired login states");
    }
    metrics::gauge!("bridge_pending_states").set(pending as f64);
}
