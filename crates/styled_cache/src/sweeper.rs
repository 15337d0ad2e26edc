//! Periodic maintenance for hosts running a tokio runtime.

use crate::manager::StyleCache;
use core::time::Duration;
use log::debug;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Drive [`StyleCache::run_maintenance`] every `every`.
///
/// The task holds a weak handle and ends once the cache is dropped; abort the returned
/// handle to stop it earlier. Must be called from within a tokio runtime.
pub fn spawn_sweeper(cache: &Arc<StyleCache>, every: Duration) -> JoinHandle<()> {
    let cache = Arc::downgrade(cache);
    let period = every.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(cache) = cache.upgrade() else {
                debug!(target: "styled_cache", "Cache dropped, stopping sweeper");
                break;
            };
            cache.run_maintenance();
        }
    })
}
