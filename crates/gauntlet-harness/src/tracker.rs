//! Outward-facing assertion counting.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{HarnessError, HarnessResult};

/// Counts the test assertions evaluated during a phase.
///
/// Independent of the probe counters: only checks made through
/// [`check`](Self::check) and friends are counted. Shared by every simulated
/// user of a run and reset at the start of each phase.
#[derive(Debug, Default)]
pub struct AssertionTracker {
    evaluated: AtomicU64,
}

impl AssertionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assertions evaluated since the last reset.
    pub fn count(&self) -> u64 {
        self.evaluated.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.evaluated.store(0, Ordering::Relaxed);
    }

    fn record(&self) {
        self.evaluated.fetch_add(1, Ordering::Relaxed);
    }

    /// Fail with `message` unless `condition` holds.
    pub fn check(&self, condition: bool, message: &str) -> HarnessResult<()> {
        self.record();
        if condition {
            Ok(())
        } else {
            Err(HarnessError::CheckFailed(message.to_string()))
        }
    }

    pub fn check_eq<T: PartialEq + Debug>(
        &self,
        message: &str,
        expected: T,
        actual: T,
    ) -> HarnessResult<()> {
        self.record();
        if expected == actual {
            Ok(())
        } else {
            Err(HarnessError::CheckFailed(format!(
                "{message}: expected {expected:?}, got {actual:?}"
            )))
        }
    }

    pub fn check_ne<T: PartialEq + Debug>(
        &self,
        message: &str,
        unexpected: T,
        actual: T,
    ) -> HarnessResult<()> {
        self.record();
        if unexpected != actual {
            Ok(())
        } else {
            Err(HarnessError::CheckFailed(format!(
                "{message}: both values are {actual:?}"
            )))
        }
    }

    pub fn check_some<T>(&self, message: &str, value: Option<T>) -> HarnessResult<T> {
        self.record();
        value.ok_or_else(|| HarnessError::CheckFailed(message.to_string()))
    }

    /// Unconditional failure; still counted.
    pub fn fail(&self, message: &str) -> HarnessError {
        self.record();
        HarnessError::CheckFailed(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_check_is_counted() {
        let tracker = AssertionTracker::new();
        tracker.check(true, "ok").unwrap();
        assert!(tracker.check(false, "nope").is_err());
        tracker.check_eq("eq", 1, 1).unwrap();
        tracker.check_ne("ne", 1, 2).unwrap();
        assert_eq!(tracker.check_some("some", Some(3)).unwrap(), 3);
        let _ = tracker.fail("boom");

        assert_eq!(tracker.count(), 6);
        tracker.reset();
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn failure_messages() {
        let tracker = AssertionTracker::new();
        let err = tracker.check_eq("sizes", 3, 4).unwrap_err();
        assert_eq!(err.to_string(), "check failed: sizes: expected 3, got 4");

        let err = tracker.check_ne("ids", "a", "a").unwrap_err();
        assert!(err.to_string().contains("both values are \"a\""));

        let err = tracker.check_some::<u8>("value present", None).unwrap_err();
        assert_eq!(err.to_string(), "check failed: value present");
    }
}
