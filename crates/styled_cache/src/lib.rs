//! Content-addressed cache for compiled styles.
//!
//! Wraps `styled_compiler` so that expressing the same style twice never produces more
//! than one rule set. Repeated requests resolve with a single hash lookup.
//!
//! # Architecture
//!
//! - **`StyleCache`**: explicit context object owning the style and keyframe stores
//! - **Fingerprint**: `FxHash` of namespace, input and output-affecting settings
//! - **Identifier**: issued once per entry, never reissued within a process
//! - **Sink**: external collaborator that makes rule text effective
//! - **Maintenance**: debounced, single-flight eviction on insertion and on a timer
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use styled_cache::{ConfigUpdate, MemorySink, StyleCache};
//! use styled_compiler::style;
//!
//! let sink = Arc::new(MemorySink::new());
//! let cache = StyleCache::new();
//! cache.configure(ConfigUpdate::new().with_prefix("app").with_sink(sink.clone()));
//!
//! let card = cache.style(&style! { "padding" => 16 });
//! assert!(card.as_str().starts_with("app-"));
//! assert_eq!(sink.stylesheet(), format!(".{card} {{ padding: 16px; }}"));
//! ```

#![allow(
    clippy::module_name_repetitions,
    reason = "Types like StyleCache and CacheStats read better with the prefix"
)]

mod config;
pub mod fingerprint;
mod identifier;
mod maintenance;
mod manager;
mod options;
mod pending;
mod sequence;
mod sink;
mod stats;
mod storage;
mod sweeper;

pub use config::{
    ConfigUpdate, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_IDLE, DEFAULT_PREFIX, DEFAULT_SWEEP_DEBOUNCE,
    DEFAULT_SWEEP_INTERVAL, IdentifierGenerator, InsertionMode, PostProcessor, StyleConfig,
};
pub use fingerprint::{Fingerprint, Namespace};
pub use identifier::{INVALID_IDENTIFIER, Identifier, IdentifierSeed};
pub use manager::StyleCache;
pub use options::StyleOptions;
pub use sink::{MemorySink, Sink};
pub use stats::{CacheInfo, CacheStats, EntryInfo};
pub use storage::CacheEntry;
pub use sweeper::spawn_sweeper;
