//! Monotonic issue counter for identifiers.
//!
//! The counter only moves forward. Clearing or destroying a cache leaves it untouched, so
//! an identifier is never issued twice by the same cache.

use core::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct IssueSequence {
    current: AtomicU64,
}

impl IssueSequence {
    #[inline]
    pub const fn new() -> Self {
        Self {
            current: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Advance and return the new value.
    #[inline]
    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::AcqRel) + 1
    }
}

impl Default for IssueSequence {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_increasing() {
        let sequence = IssueSequence::new();
        assert_eq!(sequence.current(), 0);
        assert_eq!(sequence.advance(), 1);
        assert_eq!(sequence.advance(), 2);
        assert_eq!(sequence.current(), 2);
    }
}
