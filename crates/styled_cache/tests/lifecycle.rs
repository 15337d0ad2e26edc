#![allow(clippy::unwrap_used, reason = "Tests unwrap fixtures that are known to be valid")]

use anyhow::{Result, bail};
use core::sync::atomic::{AtomicUsize, Ordering};
use serde_json::json;
use std::sync::Arc;
use styled_cache::{ConfigUpdate, MemorySink, Sink, StyleCache, StyleOptions};
use styled_compiler::{StyleDescription, keyframes, style};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct CountingSink {
    calls: AtomicUsize,
}

impl Sink for CountingSink {
    fn materialize(&self, _rule_text: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingSink;

impl Sink for FailingSink {
    fn materialize(&self, rule_text: &str) -> Result<()> {
        bail!("style sheet is read-only, dropped {} bytes", rule_text.len())
    }
}

struct PanickingSink;

impl Sink for PanickingSink {
    #[allow(clippy::panic, reason = "Exercises panic containment")]
    fn materialize(&self, _rule_text: &str) -> Result<()> {
        panic!("host style sheet went away")
    }
}

fn counting_cache(update: ConfigUpdate) -> (StyleCache, Arc<CountingSink>) {
    let sink = Arc::new(CountingSink::default());
    let cache = StyleCache::new();
    cache.configure(update.with_sink(Arc::clone(&sink) as Arc<dyn Sink>));
    (cache, sink)
}

#[test]
fn end_to_end_with_custom_prefix() {
    init_logging();
    let cache = StyleCache::new();
    cache.configure(ConfigUpdate::new().with_prefix("t"));

    let blue = style! { "color" => "blue" };
    let identifier = cache.style(&blue);
    let token = identifier.as_str().strip_prefix("t-").unwrap();
    assert!(!token.is_empty());
    assert!(token.chars().all(|character| character.is_ascii_alphanumeric()));

    assert!(cache.has_style(&blue));
    cache.clear();
    assert!(!cache.has_style(&blue));
}

#[test]
fn equal_descriptions_share_one_identifier_and_one_sink_call() {
    init_logging();
    let (cache, sink) = counting_cache(ConfigUpdate::new());
    let first = cache.style(&style! { "color" => "red", "padding" => 16 });
    let second = cache.style(&style! { "color" => "red", "padding" => 16 });
    assert_eq!(first, second);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn eviction_enforces_the_entry_bound() {
    init_logging();
    let (cache, _sink) = counting_cache(ConfigUpdate::new().with_max_entries(10));
    for index in 0..11 {
        cache.style(&StyleDescription::new().with("zIndex", index));
    }
    cache.evict();
    assert!(cache.stats().style_entries <= 10);
}

#[test]
fn disabled_cache_materializes_every_call() {
    init_logging();
    let (cache, sink) = counting_cache(ConfigUpdate::new().with_cache(false));
    let description = style! { "color" => "red" };
    cache.style(&description);
    cache.style(&description);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    assert!(!cache.has_style(&description));
    assert_eq!(cache.stats().misses, 2);
}

#[test]
fn failing_sinks_never_break_callers() {
    init_logging();
    for sink in [Arc::new(FailingSink) as Arc<dyn Sink>, Arc::new(PanickingSink) as Arc<dyn Sink>] {
        let cache = StyleCache::new();
        cache.configure(ConfigUpdate::new().with_sink(sink));
        for _ in 0..3 {
            let identifier = cache.style(&style! { "margin" => 4 });
            assert!(!identifier.as_str().is_empty());
            assert!(!identifier.is_invalid());
        }
        let animation = cache.get_or_create_keyframes(&keyframes! { "to" => { "opacity" => 1 } });
        assert!(!animation.is_invalid());
        assert!(!cache.inject_global("html", &style! { "fontSize" => 16 }));

        let stats = cache.stats();
        assert_eq!(stats.total_entries(), 0);
        assert_eq!(stats.materialization_failures, 5);
    }
}

#[test]
fn json_requests_match_built_descriptions() {
    init_logging();
    let cache = StyleCache::new();
    let from_json = cache.get_or_create_style_json(
        &json!({ "padding": 8, "&:hover": { "opacity": 0.9 } }),
        &StyleOptions::default(),
    );
    let built = cache.style(&style! { "padding" => 8, "&:hover" => { "opacity" => 0.9 } });
    assert_eq!(from_json, built);

    let rejected = cache.get_or_create_style_json(&json!(["padding", 8]), &StyleOptions::default());
    assert!(rejected.is_invalid());
    let rejected_stops = cache.get_or_create_keyframes_json(&json!({}));
    assert!(rejected_stops.is_invalid());
    assert_eq!(cache.stats().invalid_inputs, 2);
}

#[test]
fn minified_output_reaches_the_sink() {
    init_logging();
    let sink = Arc::new(MemorySink::new());
    let cache = StyleCache::new();
    cache.configure(
        ConfigUpdate::new()
            .with_minify(true)
            .with_sink(Arc::clone(&sink) as Arc<dyn Sink>),
    );
    let identifier = cache.style(&style! { "padding" => 8, "&:hover" => { "opacity" => 0.9 } });
    assert_eq!(
        sink.stylesheet(),
        format!(".{identifier}{{padding:8px}}.{identifier}:hover{{opacity:0.9}}")
    );
}

#[test]
fn debug_labels_are_readable() {
    init_logging();
    let cache = StyleCache::new();
    cache.configure(ConfigUpdate::new().with_debug(true));
    let identifier = cache.get_or_create_style(&style! { "display" => "grid" }, &StyleOptions::labelled("Card"));
    assert!(identifier.as_str().starts_with("css-Card-"));
}

#[test]
fn destroy_resets_everything_but_never_reissues() {
    init_logging();
    let sink = Arc::new(MemorySink::new());
    let cache = StyleCache::new();
    cache.configure(ConfigUpdate::new().with_sink(Arc::clone(&sink) as Arc<dyn Sink>));

    let description = style! { "color" => "teal" };
    let before = cache.style(&description);
    assert_eq!(sink.len(), 1);

    cache.destroy();
    assert!(sink.is_empty());
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.materializations), (0, 0, 0));
    assert_eq!(stats.total_entries(), 0);

    let after = cache.style(&description);
    assert_ne!(before, after);
    assert_eq!(sink.len(), 1);
    assert_eq!(cache.config().identifier_prefix, "css");
}

#[test]
fn cache_info_lists_live_entries() {
    init_logging();
    let cache = StyleCache::new();
    let identifier = cache.style(&style! { "color" => "red" });
    cache.style(&style! { "color" => "red" });
    let info = cache.cache_info();
    assert_eq!(info.styles.len(), 1);
    assert!(info.keyframes.is_empty());
    let entry = &info.styles[0];
    assert_eq!(entry.identifier, identifier);
    assert_eq!(entry.use_count, 2);
    assert_eq!(entry.rule_text, format!(".{identifier} {{ color: red; }}"));

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["styles"][0]["useCount"], 2);
}
