//! Debounced, single-flight scheduling of eviction sweeps.
//!
//! Both the insertion path and the timer path funnel through [`MaintenanceSchedule::run`].
//! Requests raised while a sweep is running, or inside the debounce window, collapse into
//! the next run.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use parking_lot::Mutex;
use std::time::Instant;

#[derive(Debug, Default)]
pub struct MaintenanceSchedule {
    running: AtomicBool,
    requested: AtomicBool,
    last_run: Mutex<Option<Instant>>,
}

/// Clears the running flag when the sweep finishes or unwinds.
struct RunningGuard<'flag>(&'flag AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MaintenanceSchedule {
    #[inline]
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// True while the last run is more recent than `debounce`.
    pub fn within_debounce(&self, now: Instant, debounce: Duration) -> bool {
        self.last_run
            .lock()
            .is_some_and(|last| now.saturating_duration_since(last) < debounce)
    }

    /// Whether the timer path should sweep: a request is outstanding or `interval`
    /// has passed since the last run.
    pub fn is_due(&self, now: Instant, interval: Duration) -> bool {
        self.is_requested()
            || self
                .last_run
                .lock()
                .is_none_or(|last| now.saturating_duration_since(last) >= interval)
    }

    /// Run `task` unless another run is in flight. Returns `None` when skipped.
    pub fn run<T>(&self, now: Instant, task: impl FnOnce() -> T) -> Option<T> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        let _guard = RunningGuard(&self.running);
        self.requested.store(false, Ordering::Release);
        let result = task();
        *self.last_run.lock() = Some(now);
        Some(result)
    }

    pub fn reset(&self) {
        self.requested.store(false, Ordering::Release);
        *self.last_run.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debounce_window() {
        let schedule = MaintenanceSchedule::default();
        let start = Instant::now();
        assert!(!schedule.within_debounce(start, Duration::from_secs(1)));
        assert_eq!(schedule.run(start, || 3), Some(3));
        assert!(schedule.within_debounce(start + Duration::from_millis(500), Duration::from_secs(1)));
        assert!(!schedule.within_debounce(start + Duration::from_secs(2), Duration::from_secs(1)));
    }

    #[test]
    fn due_when_requested_or_interval_elapsed() {
        let schedule = MaintenanceSchedule::default();
        let start = Instant::now();
        assert!(schedule.is_due(start, Duration::from_secs(60)));
        assert_eq!(schedule.run(start, || ()), Some(()));
        assert!(!schedule.is_due(start + Duration::from_secs(1), Duration::from_secs(60)));
        schedule.request();
        assert!(schedule.is_due(start + Duration::from_secs(1), Duration::from_secs(60)));
        assert_eq!(schedule.run(start, || ()), Some(()));
        assert!(!schedule.is_requested());
        assert!(schedule.is_due(start + Duration::from_secs(61), Duration::from_secs(60)));
    }

    #[test]
    fn overlapping_runs_collapse() {
        let schedule = MaintenanceSchedule::default();
        let now = Instant::now();
        let outer = schedule.run(now, || schedule.run(now, || "inner"));
        assert_eq!(outer, Some(None));
        assert_eq!(schedule.run(now, || "again"), Some("again"));
    }

    #[test]
    fn reset_forgets_history() {
        let schedule = MaintenanceSchedule::default();
        let now = Instant::now();
        schedule.request();
        assert_eq!(schedule.run(now, || ()), Some(()));
        schedule.reset();
        assert!(!schedule.within_debounce(now, Duration::from_secs(1)));
        assert!(!schedule.is_requested());
    }
}
