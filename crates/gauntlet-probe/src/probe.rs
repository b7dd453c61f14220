//! Public instrumentation entry point.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::counter::{CounterRegistry, CounterSnapshot};
use crate::dispatcher::{CounterDispatcher, Increment, SuspendGuard};
use crate::error::ProbeResult;

/// Probe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Panic when a probed condition is false.
    #[serde(default = "default_checks_enabled")]
    pub checks_enabled: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            checks_enabled: default_checks_enabled(),
        }
    }
}

fn default_checks_enabled() -> bool {
    cfg!(debug_assertions)
}

/// Handle for counting defensive-programming checks.
///
/// Every call bumps the global counter plus either the anonymous counter or
/// a named one. Both increments are queued on the dispatcher; the call
/// returns without waiting for them. Clones share the same registry and
/// dispatcher.
#[derive(Clone)]
pub struct AssertionProbe {
    inner: Arc<ProbeInner>,
}

struct ProbeInner {
    registry: Arc<CounterRegistry>,
    dispatcher: CounterDispatcher,
    config: ProbeConfig,
}

impl AssertionProbe {
    /// Create a probe with its own registry.
    pub fn new(config: ProbeConfig) -> ProbeResult<Self> {
        Self::with_registry(Arc::new(CounterRegistry::new()), config)
    }

    /// Create a probe that records into an existing registry.
    pub fn with_registry(registry: Arc<CounterRegistry>, config: ProbeConfig) -> ProbeResult<Self> {
        let dispatcher = CounterDispatcher::spawn(Arc::clone(&registry))?;
        Ok(Self {
            inner: Arc::new(ProbeInner {
                registry,
                dispatcher,
                config,
            }),
        })
    }

    /// Count an anonymous check and evaluate `condition`.
    #[track_caller]
    pub fn probe(&self, condition: bool) {
        self.dispatch(Increment::Anonymous);
        self.evaluate(condition, None);
    }

    /// Count a check against the counter called `name` and evaluate `condition`.
    ///
    /// A blank name counts as anonymous.
    #[track_caller]
    pub fn probe_named(&self, name: &str, condition: bool) {
        let name = name.trim();
        if name.is_empty() {
            self.dispatch(Increment::Anonymous);
            self.evaluate(condition, None);
        } else {
            self.dispatch(Increment::Named(self.inner.registry.named(name)));
            self.evaluate(condition, Some(name));
        }
    }

    fn dispatch(&self, increment: Increment) {
        let dispatcher = &self.inner.dispatcher;
        if dispatcher.submit(Increment::Global).is_err() || dispatcher.submit(increment).is_err() {
            debug!("probe dropped: counter dispatcher closed");
        }
    }

    #[track_caller]
    fn evaluate(&self, condition: bool, name: Option<&str>) {
        if self.inner.config.checks_enabled && !condition {
            match name {
                Some(name) => panic!("internal check '{name}' failed"),
                None => panic!("internal check failed"),
            }
        }
    }

    pub fn registry(&self) -> &Arc<CounterRegistry> {
        &self.inner.registry
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.inner.config
    }

    pub fn global_count(&self) -> u64 {
        self.inner.registry.global().get()
    }

    pub fn anonymous_count(&self) -> u64 {
        self.inner.registry.anonymous().get()
    }

    pub fn named_count(&self, name: &str) -> u64 {
        self.inner.registry.named_count(name)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        self.inner.registry.snapshot()
    }

    /// Zero every counter. Increments still queued land afterwards.
    pub fn reset(&self) {
        self.inner.registry.reset();
    }

    /// Increments queued but not yet applied.
    pub fn pending(&self) -> u64 {
        self.inner.dispatcher.pending()
    }

    /// Wait until every probe issued so far is visible.
    pub async fn flush(&self) -> ProbeResult<()> {
        self.inner.dispatcher.flush().await
    }

    /// Blocking variant of [`flush`](Self::flush); not for use inside async tasks.
    pub fn flush_blocking(&self) -> ProbeResult<()> {
        self.inner.dispatcher.flush_blocking()
    }

    /// Park the dispatcher worker until the guard is dropped.
    pub fn suspend(&self) -> ProbeResult<SuspendGuard> {
        self.inner.dispatcher.suspend()
    }
}

impl std::fmt::Debug for AssertionProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssertionProbe")
            .field("config", &self.inner.config)
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inert() -> AssertionProbe {
        AssertionProbe::new(ProbeConfig {
            checks_enabled: false,
        })
        .unwrap()
    }

    #[test]
    fn anonymous_probe_counts_global_and_anonymous() {
        let probe = inert();
        for _ in 0..25 {
            probe.probe(true);
        }
        probe.flush_blocking().unwrap();

        assert_eq!(probe.global_count(), 25);
        assert_eq!(probe.anonymous_count(), 25);
        assert!(probe.snapshot().named.is_empty());
    }

    #[test]
    fn named_probe_does_not_touch_anonymous() {
        let probe = inert();
        probe.probe_named("lookup", true);
        probe.probe_named("lookup", true);
        probe.probe_named("insert", true);
        probe.flush_blocking().unwrap();

        assert_eq!(probe.global_count(), 3);
        assert_eq!(probe.anonymous_count(), 0);
        assert_eq!(probe.named_count("lookup"), 2);
        assert_eq!(probe.named_count("insert"), 1);
    }

    #[test]
    fn blank_name_counts_as_anonymous() {
        let probe = inert();
        probe.probe_named("   ", true);
        probe.probe_named("", true);
        probe.flush_blocking().unwrap();

        assert_eq!(probe.anonymous_count(), 2);
        assert!(probe.registry().names().is_empty());
    }

    #[test]
    fn false_condition_is_inert_when_checks_disabled() {
        let probe = inert();
        probe.probe(false);
        probe.probe_named("never", false);
        probe.flush_blocking().unwrap();
        assert_eq!(probe.global_count(), 2);
    }

    #[test]
    #[should_panic(expected = "internal check 'invariant' failed")]
    fn false_condition_panics_when_checks_enabled() {
        let probe = AssertionProbe::new(ProbeConfig {
            checks_enabled: true,
        })
        .unwrap();
        probe.probe_named("invariant", false);
    }

    #[test]
    fn clones_share_counters() {
        let probe = inert();
        let other = probe.clone();
        probe.probe(true);
        other.probe(true);
        other.flush_blocking().unwrap();
        assert_eq!(probe.global_count(), 2);
    }

    #[test]
    fn reset_clears_all_counters() {
        let probe = inert();
        probe.probe(true);
        probe.probe_named("a", true);
        probe.flush_blocking().unwrap();

        probe.reset();

        let snapshot = probe.snapshot();
        assert_eq!(snapshot.global, 0);
        assert_eq!(snapshot.anonymous, 0);
        assert_eq!(snapshot.named.get("a"), Some(&0));
    }
}
