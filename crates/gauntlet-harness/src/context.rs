//! Run-scoped state shared by the orchestrator and the simulated users.

use std::sync::atomic::{AtomicU64, Ordering};

use gauntlet_probe::AssertionProbe;

use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::params::ParameterDerivation;
use crate::tracker::AssertionTracker;

/// Aggregate of per-user item counts during the thread-safety phase.
#[derive(Debug, Default)]
pub struct SharedCounter {
    value: AtomicU64,
}

impl SharedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` and return the new total.
    pub fn add(&self, n: u64) -> u64 {
        self.value.fetch_add(n, Ordering::AcqRel) + n
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.value.store(0, Ordering::Release);
    }
}

/// Everything one harness run shares across phases and user tasks.
pub struct HarnessContext {
    config: HarnessConfig,
    derivation: ParameterDerivation,
    tracker: AssertionTracker,
    shared: SharedCounter,
    probe: AssertionProbe,
}

impl HarnessContext {
    /// Fails if `config` does not validate.
    pub fn new(config: HarnessConfig, probe: AssertionProbe) -> HarnessResult<Self> {
        Ok(Self {
            derivation: ParameterDerivation::new(&config)?,
            config,
            tracker: AssertionTracker::new(),
            shared: SharedCounter::new(),
            probe,
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn derivation(&self) -> &ParameterDerivation {
        &self.derivation
    }

    pub fn tracker(&self) -> &AssertionTracker {
        &self.tracker
    }

    pub fn shared(&self) -> &SharedCounter {
        &self.shared
    }

    pub fn probe(&self) -> &AssertionProbe {
        &self.probe
    }
}
