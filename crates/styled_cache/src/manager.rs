//! Cache and lifecycle manager.
//!
//! [`StyleCache`] maps compile requests to identifiers. A request is fingerprinted, looked
//! up in the store of its namespace and only compiled on a miss:
//!
//! ```text
//! request ── fingerprint ──► store hit ──► identifier (usage touched)
//!                               │
//!                              miss ── issue identifier ── compile ── post-process
//!                                                                       │
//!                                   sync: sink now │ deferred/idle: queue
//!                                                  ↓
//!                                    cache entry (only if delivery did not fail)
//! ```
//!
//! No public operation returns an error or panics. Rejected input yields
//! [`Identifier::invalid`], sink failures leave the entry uncached so a later call retries,
//! and both are counted in [`CacheStats`] and logged under the `styled_cache` target.

use crate::config::{ConfigUpdate, InsertionMode, StyleConfig};
use crate::fingerprint::{self, Fingerprint, Namespace, text_digest};
use crate::identifier::{self, Identifier, IdentifierSeed};
use crate::maintenance::MaintenanceSchedule;
use crate::options::StyleOptions;
use crate::pending::{PendingMaterialization, PendingQueue};
use crate::sequence::IssueSequence;
use crate::sink::{materialize_guarded, release_guarded};
use crate::stats::{CacheInfo, CacheStats, Counters};
use crate::storage::{CacheEntry, EntryStore, Lookup};
use core::fmt::Display;
use log::{debug, info, trace, warn};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashSet;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Instant;
use styled_compiler::{KeyframeStops, StyleDescription, compile_keyframes, compile_with};
use tracing::debug_span;

/// Content-addressed cache of compiled styles and keyframes.
///
/// One instance is meant to live for the whole process and be shared by handle
/// (`Arc<StyleCache>`); tests create as many independent instances as they like.
///
/// ```
/// use styled_cache::StyleCache;
/// use styled_compiler::style;
///
/// let cache = StyleCache::new();
/// let button = style! { "padding" => 8, "&:hover" => { "opacity" => 0.9 } };
/// let first = cache.style(&button);
/// assert_eq!(cache.style(&button), first);
/// assert!(cache.has_style(&button));
/// ```
#[derive(Debug)]
pub struct StyleCache {
    config: RwLock<Arc<StyleConfig>>,
    styles: EntryStore,
    keyframes: EntryStore,
    pending: PendingQueue,
    maintenance: MaintenanceSchedule,
    counters: Counters,
    sequence: IssueSequence,
    /// Digests of repeatable rule text already handed to the current sink.
    delivered: Mutex<FxHashSet<u64>>,
}

impl Default for StyleCache {
    fn default() -> Self {
        Self::new()
    }
}

struct Request<'req> {
    namespace: Namespace,
    fingerprint: Fingerprint,
    options: Option<&'req StyleOptions>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Delivery {
    Materialized,
    Queued,
    Failed,
    /// The input compiled to nothing and was answered with the sentinel.
    Rejected,
}

impl Delivery {
    #[inline]
    const fn succeeded(self) -> bool {
        matches!(self, Self::Materialized | Self::Queued)
    }
}

struct Issued {
    identifier: Identifier,
    rule_text: Arc<str>,
    delivery: Delivery,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::with_config(StyleConfig::default())
    }

    pub fn with_config(config: StyleConfig) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            styles: EntryStore::new(),
            keyframes: EntryStore::new(),
            pending: PendingQueue::default(),
            maintenance: MaintenanceSchedule::default(),
            counters: Counters::default(),
            sequence: IssueSequence::new(),
            delivered: Mutex::new(FxHashSet::default()),
        }
    }

    /// Merge `update` over the current configuration and install the result.
    ///
    /// Entries compiled under the previous prefix or render mode stay cached but are no
    /// longer reachable, since those settings are part of every fingerprint. Installing a
    /// new sink forgets which rule text the previous one received.
    pub fn configure(&self, update: ConfigUpdate) {
        let mut current = self.config.write();
        if update.sink.is_some() {
            self.delivered.lock().clear();
        }
        let next = current.apply(update);
        debug!(target: "styled_cache", "Reconfigured: {next:?}");
        *current = Arc::new(next);
    }

    /// The configuration in effect right now.
    pub fn config(&self) -> Arc<StyleConfig> {
        Arc::clone(&self.config.read())
    }

    /// [`get_or_create_style`](Self::get_or_create_style) with default options.
    pub fn style(&self, description: &StyleDescription) -> Identifier {
        self.get_or_create_style(description, &StyleOptions::default())
    }

    /// Identifier for `description`, compiling and materializing it on first use.
    ///
    /// The identifier is returned even when the sink fails; in that case nothing is
    /// cached and the next call compiles again.
    pub fn get_or_create_style(&self, description: &StyleDescription, options: &StyleOptions) -> Identifier {
        let config = self.config();
        let request = Request {
            namespace: Namespace::Style,
            fingerprint: fingerprint::style(description, options, &config),
            options: Some(options),
        };
        let (identifier, _) = self.resolve(&config, &request, |identifier| {
            Some(compile_with(description, &identifier.class_selector(), config.compile_options()).rule_text)
        });
        identifier
    }

    /// Like [`get_or_create_style`](Self::get_or_create_style) for a JSON description.
    ///
    /// Anything that is not a JSON object yields [`Identifier::invalid`].
    pub fn get_or_create_style_json(&self, description: &JsonValue, options: &StyleOptions) -> Identifier {
        match StyleDescription::try_from(description.clone()) {
            Ok(parsed) => self.get_or_create_style(&parsed, options),
            Err(error) => self.reject(&error),
        }
    }

    /// Identifier of the `@keyframes` block for `stops`.
    ///
    /// A stop set that is empty, or whose stops hold no declarations, is rejected.
    pub fn get_or_create_keyframes(&self, stops: &KeyframeStops) -> Identifier {
        if stops.is_empty() {
            return self.reject(&"empty keyframe stop set");
        }
        let config = self.config();
        let request = Request {
            namespace: Namespace::Keyframes,
            fingerprint: fingerprint::keyframes(stops, &config),
            options: None,
        };
        let (identifier, _) = self.resolve(&config, &request, |identifier| {
            let rule_text = compile_keyframes(identifier.as_str(), stops, config.compile_options()).rule_text;
            (!rule_text.is_empty()).then_some(rule_text)
        });
        identifier
    }

    pub fn get_or_create_keyframes_json(&self, stops: &JsonValue) -> Identifier {
        match KeyframeStops::try_from(stops.clone()) {
            Ok(parsed) => self.get_or_create_keyframes(&parsed),
            Err(error) => self.reject(&error),
        }
    }

    /// Compile `description` against a raw `selector` (for example `body` or `:root`) and
    /// materialize it once. Returns whether the rule text is delivered or queued.
    pub fn inject_global(&self, selector: &str, description: &StyleDescription) -> bool {
        let selector = selector.trim();
        if selector.is_empty() {
            self.reject(&"empty global selector");
            return false;
        }
        let config = self.config();
        let request = Request {
            namespace: Namespace::Global,
            fingerprint: fingerprint::global(selector, description, &config),
            options: None,
        };
        let (_, delivered) = self.resolve(&config, &request, |_| {
            Some(compile_with(description, selector, config.compile_options()).rule_text)
        });
        delivered
    }

    /// Whether `description` with default options has a live entry. Usage is not touched.
    pub fn has_style(&self, description: &StyleDescription) -> bool {
        self.has_style_with(description, &StyleOptions::default())
    }

    pub fn has_style_with(&self, description: &StyleDescription, options: &StyleOptions) -> bool {
        let config = self.config();
        self.styles.contains(fingerprint::style(description, options, &config))
    }

    pub fn has_keyframes(&self, stops: &KeyframeStops) -> bool {
        let config = self.config();
        self.keyframes.contains(fingerprint::keyframes(stops, &config))
    }

    /// Sweep both caches now. Returns the number of removed entries.
    pub fn evict(&self) -> usize {
        self.evict_at(Instant::now())
    }

    /// Sweep both caches as if the current time were `now`.
    ///
    /// Entries idle for longer than `max_idle` go first; if a cache still holds more than
    /// `max_cache_entries`, its least recently used surplus follows.
    pub fn evict_at(&self, now: Instant) -> usize {
        let config = self.config();
        let _span = debug_span!("styled_cache.evict").entered();
        let mut forgotten = Vec::new();
        let mut forget = |entry: &CacheEntry| forgotten.push(text_digest(&entry.rule_text));
        let removed = self.styles.sweep(now, config.max_idle, config.max_cache_entries, &mut forget)
            + self.keyframes.sweep(now, config.max_idle, config.max_cache_entries, &mut forget);
        if !forgotten.is_empty() {
            let mut delivered = self.delivered.lock();
            for digest in &forgotten {
                delivered.remove(digest);
            }
        }
        if removed > 0 {
            Counters::add(&self.counters.evictions, removed);
            debug!(target: "styled_cache", "Evicted {removed} entries");
        }
        removed
    }

    /// Timer entry point: sweep if one was requested or the sweep interval has passed.
    ///
    /// Overlapping calls collapse into a single sweep. Returns whether this call swept.
    pub fn run_maintenance(&self) -> bool {
        self.run_maintenance_at(Instant::now())
    }

    pub fn run_maintenance_at(&self, now: Instant) -> bool {
        let config = self.config();
        if !self.maintenance.is_due(now, config.sweep_interval) {
            return false;
        }
        self.sweep_once(now).is_some()
    }

    /// Materialize every rule text queued in deferred mode. Returns how many succeeded.
    pub fn flush_deferred(&self) -> usize {
        self.flush(InsertionMode::Deferred, usize::MAX)
    }

    /// Materialize at most `budget` rule texts queued in idle mode.
    pub fn flush_idle(&self, budget: usize) -> usize {
        self.flush(InsertionMode::Idle, budget)
    }

    /// Empty both caches, the pending queue and the dedup memory, and reset hit and miss
    /// counters.
    pub fn clear(&self) {
        self.styles.clear();
        self.keyframes.clear();
        self.pending.clear();
        self.delivered.lock().clear();
        self.counters.reset_lookups();
        debug!(target: "styled_cache", "Cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            style_entries: self.styles.len(),
            keyframe_entries: self.keyframes.len(),
            approx_bytes: self.styles.approx_bytes() + self.keyframes.approx_bytes(),
            pending_materializations: self.pending.len(),
            identifiers_issued: self.sequence.current(),
            ..CacheStats::default()
        };
        self.counters.fill(&mut stats);
        stats
    }

    pub fn cache_info(&self) -> CacheInfo {
        let now = Instant::now();
        CacheInfo {
            styles: self.styles.snapshot(now),
            keyframes: self.keyframes.snapshot(now),
        }
    }

    /// Release the sink, clear everything and reset every counter.
    ///
    /// Afterwards the cache behaves like a fresh one, except that identifiers keep
    /// counting up and are never handed out again.
    pub fn destroy(&self) {
        let config = self.config();
        if let Err(error) = release_guarded(config.sink.as_ref()) {
            warn!(target: "styled_cache", "Sink release failed: {error:#}");
        }
        self.clear();
        self.counters.reset_all();
        self.maintenance.reset();
        info!(target: "styled_cache", "Style cache destroyed");
    }

    /// Look `request` up, compiling and delivering on a miss. `compile` returns `None`
    /// for input that produces no rule text worth an identifier.
    ///
    /// Returns the identifier and whether its rule text is (or will be) delivered.
    fn resolve(
        &self,
        config: &StyleConfig,
        request: &Request<'_>,
        compile: impl FnOnce(&Identifier) -> Option<String>,
    ) -> (Identifier, bool) {
        let now = Instant::now();
        if !config.enable_cache {
            let issued = self.issue(config, request, compile);
            if issued.delivery != Delivery::Rejected {
                Counters::bump(&self.counters.misses);
            }
            return (issued.identifier, issued.delivery.succeeded());
        }

        let lookup = self.store(request.namespace).get_or_admit(request.fingerprint, now, || {
            let issued = self.issue(config, request, compile);
            let entry = match issued.delivery {
                Delivery::Failed | Delivery::Rejected => None,
                Delivery::Materialized | Delivery::Queued => Some(CacheEntry::new(
                    issued.identifier.clone(),
                    Arc::clone(&issued.rule_text),
                    now,
                    issued.delivery == Delivery::Materialized,
                )),
            };
            (issued, entry)
        });

        match lookup {
            Lookup::Hit(identifier) => {
                Counters::bump(&self.counters.hits);
                (identifier, true)
            }
            Lookup::Miss(issued) => {
                if issued.delivery == Delivery::Rejected {
                    return (issued.identifier, false);
                }
                Counters::bump(&self.counters.misses);
                let delivered = issued.delivery.succeeded();
                if delivered {
                    self.after_insert(config, now);
                }
                (issued.identifier, delivered)
            }
        }
    }

    /// Allocate an identifier, compile and deliver according to the insertion mode.
    fn issue(
        &self,
        config: &StyleConfig,
        request: &Request<'_>,
        compile: impl FnOnce(&Identifier) -> Option<String>,
    ) -> Issued {
        let seed = IdentifierSeed {
            namespace: request.namespace,
            prefix: &config.identifier_prefix,
            fingerprint: request.fingerprint,
            sequence: self.sequence.advance(),
            label: request.options.and_then(|options| options.label.as_deref()),
        };
        let identifier = identifier::issue(&seed, request.options, config);
        let _span = debug_span!("styled_cache.compile", namespace = ?request.namespace, %identifier).entered();

        let Some(mut rule_text) = compile(&identifier) else {
            return Issued {
                identifier: self.reject(&format_args!("{} compiled to no rules", request.fingerprint)),
                rule_text: Arc::from(""),
                delivery: Delivery::Rejected,
            };
        };
        if let Some(post_process) = &config.post_processor
            && !rule_text.is_empty()
        {
            rule_text = post_process(&rule_text);
        }
        if config.debug {
            info!(target: "styled_cache", "Compiled {identifier} ({} bytes): {rule_text}", rule_text.len());
        } else {
            trace!(target: "styled_cache", "Cache miss for {}, compiled {identifier}", request.fingerprint);
        }

        let rule_text: Arc<str> = Arc::from(rule_text);
        let repeatable = request.namespace == Namespace::Global
            || request.options.is_some_and(|options| options.name.is_some())
            || config.identifier_generator.is_some();
        let delivery = match config.insertion_mode {
            InsertionMode::Sync => {
                if self.materialize(config, &rule_text, repeatable) {
                    Delivery::Materialized
                } else {
                    Delivery::Failed
                }
            }
            mode @ (InsertionMode::Deferred | InsertionMode::Idle) => {
                if rule_text.is_empty() {
                    Delivery::Materialized
                } else {
                    self.pending.push(PendingMaterialization {
                        namespace: request.namespace,
                        fingerprint: request.fingerprint,
                        identifier: identifier.clone(),
                        rule_text: Arc::clone(&rule_text),
                        mode,
                        repeatable,
                    });
                    Delivery::Queued
                }
            }
        };
        Issued {
            identifier,
            rule_text,
            delivery,
        }
    }

    /// Hand `rule_text` to the sink. Empty and already delivered text count as success.
    ///
    /// Only `repeatable` text is remembered; generated identifiers make every other rule
    /// text unique. The memory holds at most one store's worth of digests per namespace
    /// and starts over once full.
    fn materialize(&self, config: &StyleConfig, rule_text: &str, repeatable: bool) -> bool {
        if rule_text.is_empty() {
            return true;
        }
        let digest = (config.deduplicate && repeatable).then(|| text_digest(rule_text));
        let already_delivered =
            digest.is_some_and(|digest| self.delivered.lock().contains(&digest));
        if already_delivered {
            trace!(target: "styled_cache", "Rule text already delivered, skipping sink");
            return true;
        }
        match materialize_guarded(config.sink.as_ref(), rule_text) {
            Ok(()) => {
                Counters::bump(&self.counters.materializations);
                if let Some(digest) = digest {
                    let mut delivered = self.delivered.lock();
                    if delivered.len() >= config.max_cache_entries.saturating_mul(2) {
                        trace!(target: "styled_cache", "Dedup memory full, starting over");
                        delivered.clear();
                    }
                    delivered.insert(digest);
                }
                true
            }
            Err(error) => {
                Counters::bump(&self.counters.materialization_failures);
                warn!(target: "styled_cache", "Materialization failed, entry left uncached: {error:#}");
                false
            }
        }
    }

    fn flush(&self, mode: InsertionMode, budget: usize) -> usize {
        let items = self.pending.drain(mode, budget);
        if items.is_empty() {
            return 0;
        }
        let config = self.config();
        let _span = debug_span!("styled_cache.flush", ?mode, count = items.len()).entered();
        let mut materialized = 0;
        for item in items {
            let store = self.store(item.namespace);
            if self.materialize(&config, &item.rule_text, item.repeatable) {
                store.mark_materialized(item.fingerprint, &item.identifier);
                materialized += 1;
            } else if store.remove_if_issued(item.fingerprint, &item.identifier) {
                debug!(target: "styled_cache", "Dropped {} after failed deferred materialization", item.identifier);
            }
        }
        materialized
    }

    /// Request maintenance and sweep inline unless a sweep ran within the debounce window.
    fn after_insert(&self, config: &StyleConfig, now: Instant) {
        self.maintenance.request();
        if self.maintenance.within_debounce(now, config.sweep_debounce) {
            return;
        }
        if let Some(removed) = self.sweep_once(now) {
            trace!(target: "styled_cache", "Insertion sweep removed {removed} entries");
        }
    }

    fn sweep_once(&self, now: Instant) -> Option<usize> {
        let removed = self.maintenance.run(now, || self.evict_at(now))?;
        Counters::bump(&self.counters.maintenance_runs);
        Some(removed)
    }

    #[inline]
    fn store(&self, namespace: Namespace) -> &EntryStore {
        match namespace {
            Namespace::Style | Namespace::Global => &self.styles,
            Namespace::Keyframes => &self.keyframes,
        }
    }

    fn reject(&self, reason: &dyn Display) -> Identifier {
        Counters::bump(&self.counters.invalid_inputs);
        warn!(target: "styled_cache", "Rejected invalid input: {reason}");
        Identifier::invalid()
    }
}
