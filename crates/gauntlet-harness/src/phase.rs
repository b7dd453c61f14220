//! Test phases and their fixed order.

use serde::{Deserialize, Serialize};

/// One of the three escalating test phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Functional,
    Performance,
    ThreadSafety,
}

impl Phase {
    /// Every phase in execution order.
    pub const ALL: [Phase; 3] = [Phase::Functional, Phase::Performance, Phase::ThreadSafety];

    /// Phase that runs after this one, or `None` once the run is done.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Functional => Some(Phase::Performance),
            Phase::Performance => Some(Phase::ThreadSafety),
            Phase::ThreadSafety => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Functional => "functional",
            Phase::Performance => "performance",
            Phase::ThreadSafety => "thread safety",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}
