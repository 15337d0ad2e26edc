use crate::identifier::Identifier;
use core::mem;
use core::time::Duration;
use std::sync::Arc;
use std::time::Instant;

/// One cached compilation.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub identifier: Identifier,
    pub rule_text: Arc<str>,
    pub created_at: Instant,
    pub last_used_at: Instant,
    pub use_count: u64,
    pub approx_bytes: usize,
    /// False while the rule text waits in the deferred queue.
    pub materialized: bool,
}

impl CacheEntry {
    pub fn new(identifier: Identifier, rule_text: Arc<str>, now: Instant, materialized: bool) -> Self {
        let approx_bytes = mem::size_of::<Self>() + identifier.as_str().len() + rule_text.len();
        Self {
            identifier,
            rule_text,
            created_at: now,
            last_used_at: now,
            use_count: 1,
            approx_bytes,
            materialized,
        }
    }

    /// Record a hit.
    #[inline]
    pub fn touch(&mut self, now: Instant) {
        self.last_used_at = self.last_used_at.max(now);
        self.use_count = self.use_count.saturating_add(1);
    }

    #[inline]
    pub fn idle(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_used_at)
    }

    #[inline]
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_updates_usage() {
        let start = Instant::now();
        let mut entry = CacheEntry::new(Identifier::invalid(), Arc::from(".x {}"), start, true);
        assert_eq!(entry.use_count, 1);
        assert!(entry.approx_bytes > ".x {}".len());

        let later = start + Duration::from_secs(5);
        entry.touch(later);
        assert_eq!(entry.use_count, 2);
        assert_eq!(entry.idle(later), Duration::ZERO);
        assert_eq!(entry.age(later), Duration::from_secs(5));

        entry.touch(start);
        assert_eq!(entry.last_used_at, later);
    }
}
