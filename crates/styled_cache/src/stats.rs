//! Read-only snapshots of cache state.

use crate::fingerprint::Fingerprint;
use crate::identifier::Identifier;
use crate::storage::CacheEntry;
use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;
use serde::Serialize;
use std::time::Instant;

/// Counters and sizes at one point in time.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, zero before the first lookup.
    pub hit_rate: f64,
    /// Style entries, including injected global rules.
    pub style_entries: usize,
    pub keyframe_entries: usize,
    pub approx_bytes: usize,
    pub evictions: u64,
    pub materializations: u64,
    pub materialization_failures: u64,
    pub invalid_inputs: u64,
    pub pending_materializations: usize,
    pub maintenance_runs: u64,
    /// Identifiers handed out since the cache was created; never reset.
    pub identifiers_issued: u64,
}

impl CacheStats {
    #[inline]
    pub fn total_entries(&self) -> usize {
        self.style_entries + self.keyframe_entries
    }
}

/// One cached entry as seen by [`StyleCache::cache_info`](crate::StyleCache::cache_info).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInfo {
    pub identifier: Identifier,
    pub fingerprint: Fingerprint,
    pub rule_text: String,
    pub use_count: u64,
    pub approx_bytes: usize,
    pub age: Duration,
    pub idle: Duration,
    pub materialized: bool,
}

impl EntryInfo {
    pub(crate) fn from_entry(fingerprint: Fingerprint, entry: &CacheEntry, now: Instant) -> Self {
        Self {
            identifier: entry.identifier.clone(),
            fingerprint,
            rule_text: entry.rule_text.to_string(),
            use_count: entry.use_count,
            approx_bytes: entry.approx_bytes,
            age: entry.age(now),
            idle: entry.idle(now),
            materialized: entry.materialized,
        }
    }
}

/// Every live entry, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub styles: Vec<EntryInfo>,
    pub keyframes: Vec<EntryInfo>,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub evictions: AtomicU64,
    pub materializations: AtomicU64,
    pub materialization_failures: AtomicU64,
    pub invalid_inputs: AtomicU64,
    pub maintenance_runs: AtomicU64,
}

impl Counters {
    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add(counter: &AtomicU64, amount: usize) {
        counter.fetch_add(amount as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    pub fn reset_lookups(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn reset_all(&self) {
        self.reset_lookups();
        for counter in [
            &self.evictions,
            &self.materializations,
            &self.materialization_failures,
            &self.invalid_inputs,
            &self.maintenance_runs,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Fill in the counter half of a [`CacheStats`].
    pub fn fill(&self, stats: &mut CacheStats) {
        stats.hits = Self::read(&self.hits);
        stats.misses = Self::read(&self.misses);
        let lookups = stats.hits + stats.misses;
        stats.hit_rate = if lookups == 0 {
            0.0
        } else {
            stats.hits as f64 / lookups as f64
        };
        stats.evictions = Self::read(&self.evictions);
        stats.materializations = Self::read(&self.materializations);
        stats.materialization_failures = Self::read(&self.materialization_failures);
        stats.invalid_inputs = Self::read(&self.invalid_inputs);
        stats.maintenance_runs = Self::read(&self.maintenance_runs);
    }
}
