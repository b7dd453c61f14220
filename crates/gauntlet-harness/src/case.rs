//! The consumer interface: what a test supplies to the harness.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ConsumerResult, HarnessError, HarnessResult};
use crate::params::ParameterMap;
use crate::phase::Phase;
use crate::tracker::AssertionTracker;

/// A component under test together with the callbacks that exercise it.
///
/// The harness calls these from worker threads. `verify` may run
/// concurrently for different component/data pairs during the thread-safety
/// phase, never for the same pair.
pub trait TestCase: Send + Sync + 'static {
    /// The thing being tested.
    type Component;
    /// Input data handed to every `verify` call.
    type Data;

    /// Display name used in log banners and reports.
    fn name(&self) -> String {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full).to_string()
    }

    /// Performance result template; needs a float slot for elapsed seconds.
    /// See [`crate::template::performance_message`].
    fn perf_result_message(&self) -> String;

    /// Thread-safety result template; needs an integer slot for the user
    /// count and a float slot for elapsed seconds.
    /// See [`crate::template::thread_safety_message`].
    fn thread_safety_result_message(&self) -> String;

    /// Produce the data for one phase or one simulated user.
    fn generate_test_data(&self, params: &ParameterMap) -> ConsumerResult<Self::Data>;

    /// Produce a fresh component instance.
    fn component_under_test(&self) -> ConsumerResult<Self::Component>;

    /// Exercise the component once.
    ///
    /// Count the items processed with [`VerifyContext::add_items`] and make
    /// assertions through the context so they are tracked.
    fn verify(
        &self,
        params: &ParameterMap,
        component: &Self::Component,
        data: &Self::Data,
        ctx: &VerifyContext<'_>,
    ) -> ConsumerResult<()>;

    /// Adjust the derived parameters of a phase before it runs.
    fn customize_parameters(&self, _phase: Phase, _params: &mut ParameterMap) {}

    /// Restore state between phases.
    fn reset(&self) -> ConsumerResult<()> {
        Ok(())
    }
}

/// Per-run handle passed to [`TestCase::verify`].
pub struct VerifyContext<'a> {
    items: &'a AtomicU64,
    tracker: &'a AssertionTracker,
}

impl<'a> VerifyContext<'a> {
    pub fn new(items: &'a AtomicU64, tracker: &'a AssertionTracker) -> Self {
        Self { items, tracker }
    }

    /// Add to the item count of this run.
    pub fn add_items(&self, n: u64) {
        self.items.fetch_add(n, Ordering::Relaxed);
    }

    /// Items counted so far in this run.
    pub fn items(&self) -> u64 {
        self.items.load(Ordering::Relaxed)
    }

    pub fn check(&self, condition: bool, message: &str) -> HarnessResult<()> {
        self.tracker.check(condition, message)
    }

    pub fn check_eq<T: PartialEq + Debug>(
        &self,
        message: &str,
        expected: T,
        actual: T,
    ) -> HarnessResult<()> {
        self.tracker.check_eq(message, expected, actual)
    }

    pub fn check_ne<T: PartialEq + Debug>(
        &self,
        message: &str,
        unexpected: T,
        actual: T,
    ) -> HarnessResult<()> {
        self.tracker.check_ne(message, unexpected, actual)
    }

    pub fn check_some<T>(&self, message: &str, value: Option<T>) -> HarnessResult<T> {
        self.tracker.check_some(message, value)
    }

    pub fn fail(&self, message: &str) -> HarnessError {
        self.tracker.fail(message)
    }
}
