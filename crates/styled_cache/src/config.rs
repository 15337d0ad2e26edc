//! Runtime configuration for the style cache.

use crate::identifier::IdentifierSeed;
use crate::sink::{MemorySink, Sink};
use core::fmt;
use core::time::Duration;
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use styled_compiler::selector::sanitize_ident;
use styled_compiler::{CompileOptions, RenderMode};

/// Rewrites rule text after compilation and before it reaches the sink.
///
/// Runs while the cache holds an entry lock, so it must not call back into the same
/// [`StyleCache`](crate::StyleCache).
pub type PostProcessor = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Produces the whole identifier for a freshly compiled entry. Output is sanitized, and
/// empty output falls back to the default scheme.
///
/// Runs while the cache holds an entry lock, so it must not call back into the same
/// [`StyleCache`](crate::StyleCache).
pub type IdentifierGenerator = Arc<dyn Fn(&IdentifierSeed<'_>) -> String + Send + Sync>;

pub const DEFAULT_PREFIX: &str = "css";
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;
pub const DEFAULT_MAX_IDLE: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_SWEEP_DEBOUNCE: Duration = Duration::from_secs(1);

/// When compiled rule text is handed to the sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertionMode {
    /// Materialize before the identifier is returned.
    #[default]
    Sync,
    /// Queue until [`flush_deferred`](crate::StyleCache::flush_deferred).
    Deferred,
    /// Queue until an idle slot drains it with
    /// [`flush_idle`](crate::StyleCache::flush_idle).
    Idle,
}

/// Effective configuration of a [`StyleCache`](crate::StyleCache).
///
/// Instances are immutable once installed; [`StyleCache::configure`](crate::StyleCache::configure)
/// swaps in a new one built with [`StyleConfig::apply`].
#[derive(Clone)]
pub struct StyleConfig {
    pub identifier_prefix: String,
    pub enable_cache: bool,
    pub insertion_mode: InsertionMode,
    pub minify: bool,
    pub max_cache_entries: usize,
    /// Skip the sink for rule text that was already delivered.
    pub deduplicate: bool,
    /// Readable identifiers (labels) and per-compilation logging.
    pub debug: bool,
    pub max_idle: Duration,
    pub sweep_interval: Duration,
    pub sweep_debounce: Duration,
    pub sink: Arc<dyn Sink>,
    pub post_processor: Option<PostProcessor>,
    pub identifier_generator: Option<IdentifierGenerator>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            identifier_prefix: DEFAULT_PREFIX.to_owned(),
            enable_cache: true,
            insertion_mode: InsertionMode::Sync,
            minify: false,
            max_cache_entries: DEFAULT_MAX_ENTRIES,
            deduplicate: true,
            debug: false,
            max_idle: DEFAULT_MAX_IDLE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            sweep_debounce: DEFAULT_SWEEP_DEBOUNCE,
            sink: Arc::new(MemorySink::new()),
            post_processor: None,
            identifier_generator: None,
        }
    }
}

impl fmt::Debug for StyleConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StyleConfig")
            .field("identifier_prefix", &self.identifier_prefix)
            .field("enable_cache", &self.enable_cache)
            .field("insertion_mode", &self.insertion_mode)
            .field("minify", &self.minify)
            .field("max_cache_entries", &self.max_cache_entries)
            .field("deduplicate", &self.deduplicate)
            .field("debug", &self.debug)
            .field("max_idle", &self.max_idle)
            .field("sweep_interval", &self.sweep_interval)
            .field("sweep_debounce", &self.sweep_debounce)
            .field("post_processor", &self.post_processor.is_some())
            .field("identifier_generator", &self.identifier_generator.is_some())
            .finish_non_exhaustive()
    }
}

impl StyleConfig {
    #[inline]
    pub fn render_mode(&self) -> RenderMode {
        if self.minify {
            RenderMode::Minified
        } else {
            RenderMode::Pretty
        }
    }

    #[inline]
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            mode: self.render_mode(),
        }
    }

    /// Build the configuration that results from merging `update` over `self`.
    ///
    /// Unset fields keep their current value. A prefix that sanitizes to nothing is
    /// rejected and the current prefix kept.
    #[must_use]
    pub fn apply(&self, update: ConfigUpdate) -> Self {
        let mut next = self.clone();
        if let Some(prefix) = update.identifier_prefix {
            let sanitized = sanitize_ident(&prefix);
            if sanitized.is_empty() {
                warn!(target: "styled_cache", "ignoring empty identifier prefix `{prefix}`");
            } else {
                next.identifier_prefix = sanitized;
            }
        }
        if let Some(enable_cache) = update.enable_cache {
            next.enable_cache = enable_cache;
        }
        if let Some(mode) = update.insertion_mode {
            next.insertion_mode = mode;
        }
        if let Some(minify) = update.minify {
            next.minify = minify;
        }
        if let Some(max_entries) = update.max_cache_entries {
            next.max_cache_entries = max_entries;
        }
        if let Some(deduplicate) = update.deduplicate {
            next.deduplicate = deduplicate;
        }
        if let Some(debug) = update.debug {
            next.debug = debug;
        }
        if let Some(millis) = update.max_idle_ms {
            next.max_idle = Duration::from_millis(millis);
        }
        if let Some(millis) = update.sweep_interval_ms {
            next.sweep_interval = Duration::from_millis(millis);
        }
        if let Some(millis) = update.sweep_debounce_ms {
            next.sweep_debounce = Duration::from_millis(millis);
        }
        if let Some(sink) = update.sink {
            next.sink = sink;
        }
        if update.post_processor.is_some() {
            next.post_processor = update.post_processor;
        }
        if update.identifier_generator.is_some() {
            next.identifier_generator = update.identifier_generator;
        }
        next
    }
}

/// Partial configuration merged over the current one.
///
/// Deserializes from camel-case JSON with durations in milliseconds; unknown keys are
/// ignored. Hooks (sink, post-processor, identifier generator) can only be set in code.
///
/// ```
/// use styled_cache::{ConfigUpdate, InsertionMode};
///
/// let update: ConfigUpdate =
///     serde_json::from_str(r#"{"identifierPrefix": "app", "insertionMode": "deferred", "maxIdleMs": 500}"#)
///         .unwrap();
/// assert_eq!(update.identifier_prefix.as_deref(), Some("app"));
/// assert_eq!(update.insertion_mode, Some(InsertionMode::Deferred));
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigUpdate {
    pub identifier_prefix: Option<String>,
    pub enable_cache: Option<bool>,
    pub insertion_mode: Option<InsertionMode>,
    pub minify: Option<bool>,
    pub max_cache_entries: Option<usize>,
    pub deduplicate: Option<bool>,
    pub debug: Option<bool>,
    pub max_idle_ms: Option<u64>,
    pub sweep_interval_ms: Option<u64>,
    pub sweep_debounce_ms: Option<u64>,
    #[serde(skip)]
    pub sink: Option<Arc<dyn Sink>>,
    #[serde(skip)]
    pub post_processor: Option<PostProcessor>,
    #[serde(skip)]
    pub identifier_generator: Option<IdentifierGenerator>,
}

impl ConfigUpdate {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.identifier_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.enable_cache = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_insertion_mode(mut self, mode: InsertionMode) -> Self {
        self.insertion_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = Some(minify);
        self
    }

    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_cache_entries = Some(max_entries);
        self
    }

    #[must_use]
    pub fn with_deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = Some(deduplicate);
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    #[must_use]
    pub fn with_max_idle(mut self, max_idle: Duration) -> Self {
        self.max_idle_ms = Some(duration_millis(max_idle));
        self
    }

    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_ms = Some(duration_millis(interval));
        self
    }

    #[must_use]
    pub fn with_sweep_debounce(mut self, debounce: Duration) -> Self {
        self.sweep_debounce_ms = Some(duration_millis(debounce));
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn with_post_processor(mut self, hook: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.post_processor = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn with_identifier_generator(
        mut self,
        hook: impl Fn(&IdentifierSeed<'_>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.identifier_generator = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for ConfigUpdate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ConfigUpdate")
            .field("identifier_prefix", &self.identifier_prefix)
            .field("enable_cache", &self.enable_cache)
            .field("insertion_mode", &self.insertion_mode)
            .field("minify", &self.minify)
            .field("max_cache_entries", &self.max_cache_entries)
            .field("deduplicate", &self.deduplicate)
            .field("debug", &self.debug)
            .field("max_idle_ms", &self.max_idle_ms)
            .field("sweep_interval_ms", &self.sweep_interval_ms)
            .field("sweep_debounce_ms", &self.sweep_debounce_ms)
            .field("sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
