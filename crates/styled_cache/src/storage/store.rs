use super::entry::CacheEntry;
use crate::fingerprint::Fingerprint;
use crate::identifier::Identifier;
use crate::stats::EntryInfo;
use core::time::Duration;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::trace;
use rustc_hash::FxBuildHasher;
use std::time::Instant;

/// Outcome of [`EntryStore::get_or_admit`].
pub enum Lookup<T> {
    Hit(Identifier),
    Miss(T),
}

/// Entries of one namespace keyed by fingerprint.
#[derive(Debug)]
pub struct EntryStore {
    entries: DashMap<Fingerprint, CacheEntry, FxBuildHasher>,
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryStore {
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Return the live identifier for `fingerprint`, or run `admit` under the shard lock.
    ///
    /// `admit` yields the caller's result plus the entry to cache, if any. Concurrent
    /// callers for the same fingerprint are serialized, so at most one of them admits.
    pub fn get_or_admit<T>(
        &self,
        fingerprint: Fingerprint,
        now: Instant,
        admit: impl FnOnce() -> (T, Option<CacheEntry>),
    ) -> Lookup<T> {
        let slot = self.entries.entry(fingerprint);
        match slot {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.touch(now);
                trace!(target: "styled_cache", "Cache hit for {fingerprint} -> {}", entry.identifier);
                Lookup::Hit(entry.identifier.clone())
            }
            Entry::Vacant(vacant) => {
                let (result, admitted) = admit();
                if let Some(entry) = admitted {
                    vacant.insert(entry);
                }
                Lookup::Miss(result)
            }
        }
    }

    #[inline]
    pub fn contains(&self, fingerprint: Fingerprint) -> bool {
        self.entries.contains_key(&fingerprint)
    }

    /// Remove the entry for `fingerprint` if it still carries `identifier`.
    pub fn remove_if_issued(&self, fingerprint: Fingerprint, identifier: &Identifier) -> bool {
        self.entries
            .remove_if(&fingerprint, |_, entry| entry.identifier == *identifier)
            .is_some()
    }

    pub fn mark_materialized(&self, fingerprint: Fingerprint, identifier: &Identifier) {
        if let Some(mut entry) = self.entries.get_mut(&fingerprint)
            && entry.identifier == *identifier
        {
            entry.materialized = true;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn approx_bytes(&self) -> usize {
        self.entries.iter().map(|item| item.value().approx_bytes).sum()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn snapshot(&self, now: Instant) -> Vec<EntryInfo> {
        let mut infos: Vec<EntryInfo> = self
            .entries
            .iter()
            .map(|item| EntryInfo::from_entry(*item.key(), item.value(), now))
            .collect();
        infos.sort_by(|left, right| right.age.cmp(&left.age));
        infos
    }

    /// Drop entries idle longer than `max_idle`, then the least recently used surplus
    /// above `max_entries`. `evicted` sees every removed entry. Returns how many entries
    /// were removed.
    pub fn sweep(
        &self,
        now: Instant,
        max_idle: Duration,
        max_entries: usize,
        mut evicted: impl FnMut(&CacheEntry),
    ) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = entry.idle(now) <= max_idle;
            if !keep {
                evicted(entry);
                removed += 1;
            }
            keep
        });

        let surplus = self.entries.len().saturating_sub(max_entries);
        if surplus == 0 {
            return removed;
        }
        let mut candidates: Vec<(Instant, Fingerprint)> = self
            .entries
            .iter()
            .map(|item| (item.value().last_used_at, *item.key()))
            .collect();
        let surplus = surplus.min(candidates.len());
        if surplus == 0 {
            return removed;
        }
        candidates.select_nth_unstable(surplus - 1);
        for (_, fingerprint) in candidates.iter().take(surplus) {
            if let Some((_, entry)) = self.entries.remove(fingerprint) {
                evicted(&entry);
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn entry(name: &str, now: Instant) -> CacheEntry {
        let identifier = Identifier::issued(name);
        CacheEntry::new(identifier, Arc::from(format!(".{name} {{}}")), now, true)
    }

    fn admit(store: &EntryStore, key: u64, name: &str, now: Instant) {
        let outcome = store.get_or_admit(Fingerprint::from_raw(key), now, || ((), Some(entry(name, now))));
        assert!(matches!(outcome, Lookup::Miss(())));
    }

    #[test]
    fn second_lookup_hits_and_touches() {
        let store = EntryStore::new();
        let now = Instant::now();
        admit(&store, 1, "a", now);
        let later = now + Duration::from_secs(1);
        let outcome = store.get_or_admit(Fingerprint::from_raw(1), later, || ((), None));
        assert!(matches!(outcome, Lookup::Hit(identifier) if identifier == "a"));
        assert_eq!(store.snapshot(later)[0].use_count, 2);
    }

    #[test]
    fn declined_admission_caches_nothing() {
        let store = EntryStore::new();
        let outcome = store.get_or_admit(Fingerprint::from_raw(1), Instant::now(), || (7, None));
        assert!(matches!(outcome, Lookup::Miss(7)));
        assert!(!store.contains(Fingerprint::from_raw(1)));
    }

    #[test]
    fn sweep_removes_idle_entries() {
        let store = EntryStore::new();
        let start = Instant::now();
        admit(&store, 1, "old", start);
        admit(&store, 2, "fresh", start + Duration::from_secs(50));
        let removed = store.sweep(start + Duration::from_secs(60), Duration::from_secs(30), 100, |_| {});
        assert_eq!(removed, 1);
        assert!(!store.contains(Fingerprint::from_raw(1)));
        assert!(store.contains(Fingerprint::from_raw(2)));
    }

    #[test]
    fn sweep_trims_least_recently_used_surplus() {
        let store = EntryStore::new();
        let start = Instant::now();
        for key in 0..5 {
            admit(&store, key, &format!("e{key}"), start + Duration::from_secs(key));
        }
        let mut evicted = Vec::new();
        let removed = store.sweep(start + Duration::from_secs(5), Duration::from_secs(600), 3, |entry| {
            evicted.push(entry.identifier.clone());
        });
        assert_eq!(removed, 2);
        evicted.sort();
        assert_eq!(evicted, ["e0", "e1"]);
        assert_eq!(store.len(), 3);
        assert!(!store.contains(Fingerprint::from_raw(0)));
        assert!(!store.contains(Fingerprint::from_raw(1)));
        assert!(store.contains(Fingerprint::from_raw(4)));
    }

    #[test]
    fn remove_only_matches_the_issued_identifier() {
        let store = EntryStore::new();
        admit(&store, 1, "a", Instant::now());
        assert!(!store.remove_if_issued(Fingerprint::from_raw(1), &Identifier::issued("b")));
        assert!(store.remove_if_issued(Fingerprint::from_raw(1), &Identifier::issued("a")));
        assert_eq!(store.len(), 0);
    }
}
