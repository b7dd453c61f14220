//! Probe counters and the registry that owns them.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A monotonically increasing 64-bit count.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of every counter in a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub global: u64,
    pub anonymous: u64,
    pub named: BTreeMap<String, u64>,
}

/// Owns the global counter, the anonymous counter and all named counters.
///
/// Named counters are created lazily the first time a name is seen. The
/// registry itself applies increments synchronously; callers that want the
/// fire-and-forget behaviour go through [`crate::AssertionProbe`], which
/// routes increments via the [`crate::CounterDispatcher`].
#[derive(Debug, Default)]
pub struct CounterRegistry {
    global: Counter,
    anonymous: Counter,
    named: RwLock<HashMap<String, Arc<Counter>>>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter bumped by every probe call.
    pub fn global(&self) -> &Counter {
        &self.global
    }

    /// Counter bumped by probe calls that carry no name.
    pub fn anonymous(&self) -> &Counter {
        &self.anonymous
    }

    /// Get the counter for `name`, creating a zero-valued one if needed.
    pub fn named(&self, name: &str) -> Arc<Counter> {
        if let Some(counter) = self.named.read().get(name) {
            return Arc::clone(counter);
        }

        let mut named = self.named.write();
        Arc::clone(named.entry(name.to_string()).or_default())
    }

    /// Current value of a named counter; unknown names read as zero.
    pub fn named_count(&self, name: &str) -> u64 {
        self.named.read().get(name).map(|c| c.get()).unwrap_or(0)
    }

    /// Synchronously increment the counter registered under `name`.
    pub fn increment_named(&self, name: &str) {
        self.named(name).inc();
    }

    /// Names of every counter created so far, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.named.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Zero the global, anonymous and every named counter.
    ///
    /// Named counters keep their registration, so increments already queued
    /// against them still land after the reset.
    pub fn reset(&self) {
        let named = self.named.read();
        self.global.reset();
        self.anonymous.reset();
        for counter in named.values() {
            counter.reset();
        }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        let named = self.named.read();
        CounterSnapshot {
            global: self.global.get(),
            anonymous: self.anonymous.get(),
            named: named.iter().map(|(k, v)| (k.clone(), v.get())).collect(),
        }
    }
}
