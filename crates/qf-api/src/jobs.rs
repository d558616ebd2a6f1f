//! Background jobs for periodic maintenance tasks.
//!
//! Drafts are only kept in memory; the sweeper drops the ones nobody has touched for a
//! while so an abandoned authoring session does not hold memory forever.

use std::time::Duration;

use tokio::{task::JoinHandle, time::interval};

use crate::store::DraftStore;

/// Start all background jobs
///
/// Returns the join handles so callers can abort them on shutdown
pub fn start_background_jobs(
    drafts: DraftStore,
    ttl: chrono::Duration,
    every: Duration,
) -> Vec<JoinHandle<()>> {
    vec![tokio::spawn(periodic_draft_eviction_job(drafts, ttl, every))]
}

async fn periodic_draft_eviction_job(drafts: DraftStore, ttl: chrono::Duration, every: Duration) {
    let mut interval = interval(every);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;

        match drafts.evict_idle(ttl) {
            0 => tracing::debug!("Draft sweep complete: nothing to evict"),
            evicted => tracing::info!(
                evicted,
                remaining = drafts.len(),
                "Evicted idle quiz drafts"
            ),
        }
    }
}
