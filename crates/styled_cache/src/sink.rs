//! Materialization targets for compiled rule text.

use anyhow::{Result, anyhow};
use core::any::Any;
use core::panic::AssertUnwindSafe;
use indexmap::IndexSet;
use parking_lot::Mutex;
use std::panic;

/// Receives finished rule text and makes it effective.
///
/// Implementations must be idempotent per unique text. They are called while the cache
/// holds an entry lock, so they must not call back into the same [`StyleCache`](crate::StyleCache).
pub trait Sink: Send + Sync {
    /// Make `rule_text` effective.
    ///
    /// # Errors
    ///
    /// Any error leaves the requesting entry uncached; the cache retries on a later call.
    fn materialize(&self, rule_text: &str) -> Result<()>;

    /// Drop everything materialized so far.
    fn release(&self) {}
}

/// In-memory style sheet, the default sink.
///
/// Keeps rule texts in insertion order; duplicates are ignored. Useful for server-side
/// extraction and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    rules: Mutex<IndexSet<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every materialized rule text joined by newlines.
    pub fn stylesheet(&self) -> String {
        self.rules.lock().iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }

    pub fn rules(&self) -> Vec<String> {
        self.rules.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rules.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.lock().is_empty()
    }

    pub fn contains(&self, rule_text: &str) -> bool {
        self.rules.lock().contains(rule_text)
    }
}

impl Sink for MemorySink {
    fn materialize(&self, rule_text: &str) -> Result<()> {
        self.rules.lock().insert(rule_text.to_owned());
        Ok(())
    }

    fn release(&self) {
        self.rules.lock().clear();
    }
}

/// Call `sink`, turning a panic into an error.
pub fn materialize_guarded(sink: &dyn Sink, rule_text: &str) -> Result<()> {
    panic::catch_unwind(AssertUnwindSafe(|| sink.materialize(rule_text)))
        .unwrap_or_else(|payload| Err(anyhow!("sink panicked: {}", panic_message(payload.as_ref()))))
}

/// Release `sink`, swallowing a panic.
pub fn release_guarded(sink: &dyn Sink) -> Result<()> {
    panic::catch_unwind(AssertUnwindSafe(|| sink.release()))
        .map_err(|payload| anyhow!("sink panicked on release: {}", panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
