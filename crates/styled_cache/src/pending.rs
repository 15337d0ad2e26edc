//! Queue of rule text waiting for a later materialization turn.

use crate::config::InsertionMode;
use crate::fingerprint::{Fingerprint, Namespace};
use crate::identifier::Identifier;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct PendingMaterialization {
    pub namespace: Namespace,
    pub fingerprint: Fingerprint,
    pub identifier: Identifier,
    pub rule_text: Arc<str>,
    pub mode: InsertionMode,
    /// Rule text that a later request can reproduce byte for byte.
    pub repeatable: bool,
}

#[derive(Debug, Default)]
pub struct PendingQueue {
    items: Mutex<VecDeque<PendingMaterialization>>,
}

impl PendingQueue {
    pub fn push(&self, item: PendingMaterialization) {
        self.items.lock().push_back(item);
    }

    /// Take up to `budget` items queued under `mode`, oldest first. Other items keep
    /// their order.
    pub fn drain(&self, mode: InsertionMode, budget: usize) -> Vec<PendingMaterialization> {
        let mut items = self.items.lock();
        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(items.len());
        for item in items.drain(..) {
            if item.mode == mode && taken.len() < budget {
                taken.push(item);
            } else {
                kept.push_back(item);
            }
        }
        *items = kept;
        taken
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn clear(&self) {
        self.items.lock().clear();
    }
}
