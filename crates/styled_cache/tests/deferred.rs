use anyhow::{Result, bail};
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use styled_cache::{ConfigUpdate, InsertionMode, MemorySink, Sink, StyleCache};
use styled_compiler::style;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Accepts rule text only while `open` is set.
#[derive(Default)]
struct GatedSink {
    open: AtomicBool,
    accepted: MemorySink,
}

impl Sink for GatedSink {
    fn materialize(&self, rule_text: &str) -> Result<()> {
        if !self.open.load(Ordering::SeqCst) {
            bail!("sink closed");
        }
        self.accepted.materialize(rule_text)
    }
}

fn deferred_cache(mode: InsertionMode) -> (StyleCache, Arc<GatedSink>) {
    let sink = Arc::new(GatedSink::default());
    let cache = StyleCache::new();
    cache.configure(
        ConfigUpdate::new()
            .with_insertion_mode(mode)
            .with_sink(Arc::clone(&sink) as Arc<dyn Sink>),
    );
    (cache, sink)
}

#[test]
fn identifier_is_usable_before_the_rule_text_lands() {
    init_logging();
    let (cache, sink) = deferred_cache(InsertionMode::Deferred);
    sink.open.store(true, Ordering::SeqCst);

    let description = style! { "color" => "navy" };
    let identifier = cache.style(&description);
    assert!(sink.accepted.is_empty());
    assert_eq!(cache.style(&description), identifier);

    assert_eq!(cache.flush_deferred(), 1);
    assert_eq!(sink.accepted.rules(), [format!(".{identifier} {{ color: navy; }}")]);
}

#[test]
fn failed_flush_drops_the_entry() {
    init_logging();
    let (cache, sink) = deferred_cache(InsertionMode::Deferred);
    let description = style! { "color" => "navy" };
    let first = cache.style(&description);
    assert!(cache.has_style(&description));

    assert_eq!(cache.flush_deferred(), 0);
    assert!(!cache.has_style(&description));
    assert_eq!(cache.stats().materialization_failures, 1);

    sink.open.store(true, Ordering::SeqCst);
    let second = cache.style(&description);
    assert_ne!(first, second);
    assert_eq!(cache.flush_deferred(), 1);
    assert!(cache.has_style(&description));
}

#[test]
fn idle_flushes_respect_the_budget() {
    init_logging();
    let (cache, sink) = deferred_cache(InsertionMode::Idle);
    sink.open.store(true, Ordering::SeqCst);
    for width in [10, 20, 30] {
        cache.style(&style! { "width" => width });
    }
    assert_eq!(cache.stats().pending_materializations, 3);
    assert_eq!(cache.flush_deferred(), 0);

    assert_eq!(cache.flush_idle(2), 2);
    assert_eq!(cache.stats().pending_materializations, 1);
    assert_eq!(cache.flush_idle(2), 1);
    assert_eq!(sink.accepted.len(), 3);
}

#[test]
fn clear_drops_queued_work() {
    init_logging();
    let (cache, sink) = deferred_cache(InsertionMode::Deferred);
    sink.open.store(true, Ordering::SeqCst);
    cache.style(&style! { "color" => "navy" });
    cache.clear();
    assert_eq!(cache.stats().pending_materializations, 0);
    assert_eq!(cache.flush_deferred(), 0);
    assert!(sink.accepted.is_empty());
}
