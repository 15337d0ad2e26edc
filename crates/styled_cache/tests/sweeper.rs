#![allow(clippy::unwrap_used, reason = "Tests unwrap fixtures that are known to be valid")]

use core::time::Duration;
use std::sync::Arc;
use styled_cache::{ConfigUpdate, StyleCache, spawn_sweeper};
use styled_compiler::style;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[tokio::test]
async fn sweeper_evicts_idle_entries() {
    init_logging();
    let cache = Arc::new(StyleCache::new());
    cache.configure(
        ConfigUpdate::new()
            .with_max_idle(Duration::ZERO)
            .with_sweep_interval(Duration::ZERO),
    );
    let description = style! { "color" => "red" };
    cache.style(&description);
    assert!(cache.has_style(&description));

    let handle = spawn_sweeper(&cache, Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!cache.has_style(&description));
    assert!(cache.stats().maintenance_runs >= 2);
    handle.abort();
}

#[tokio::test]
async fn sweeper_stops_when_the_cache_is_dropped() {
    init_logging();
    let cache = Arc::new(StyleCache::new());
    let handle = spawn_sweeper(&cache, Duration::from_millis(5));
    drop(cache);
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}
