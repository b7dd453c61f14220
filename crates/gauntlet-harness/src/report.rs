//! Harness run reporting

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::HarnessError;
use crate::performance::PerformanceOutcome;
use crate::phase::Phase;
use crate::simulator::ThreadSafetyOutcome;

/// Phase status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    Passed,
    Failed,
    /// Disabled through its parameter map.
    Skipped,
}

/// What a successful phase produced.
#[derive(Debug)]
pub enum PhaseOutcome {
    Functional { items: u64 },
    Performance(PerformanceOutcome),
    ThreadSafety(ThreadSafetyOutcome),
}

impl PhaseOutcome {
    /// Result message of the phase, if it has one.
    pub fn message(&self) -> Option<&str> {
        match self {
            PhaseOutcome::Functional { .. } => None,
            PhaseOutcome::Performance(outcome) => Some(&outcome.message),
            PhaseOutcome::ThreadSafety(outcome) => Some(&outcome.message),
        }
    }

    pub fn is_disabled(&self) -> bool {
        match self {
            PhaseOutcome::Functional { .. } => false,
            PhaseOutcome::Performance(outcome) => outcome.disabled,
            PhaseOutcome::ThreadSafety(outcome) => outcome.disabled,
        }
    }
}

/// Result of one phase
#[derive(Debug)]
pub struct PhaseReport {
    pub phase: Phase,
    pub result: Result<PhaseOutcome, HarnessError>,
    /// Outward-facing assertions evaluated during the phase.
    pub assertions: u64,
    /// Growth of the global probe counter during the phase.
    pub probe_delta: u64,
    pub duration: Duration,
}

impl PhaseReport {
    pub fn status(&self) -> PhaseStatus {
        match &self.result {
            Ok(outcome) if outcome.is_disabled() => PhaseStatus::Skipped,
            Ok(_) => PhaseStatus::Passed,
            Err(_) => PhaseStatus::Failed,
        }
    }

    pub fn outcome(&self) -> Option<&PhaseOutcome> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&HarnessError> {
        self.result.as_ref().err()
    }

    pub fn message(&self) -> Option<&str> {
        self.outcome().and_then(PhaseOutcome::message)
    }

    /// Simulated users that failed, for a thread-safety phase.
    pub fn user_failures(&self) -> usize {
        match self.outcome() {
            Some(PhaseOutcome::ThreadSafety(outcome)) => outcome.failures.len(),
            _ => 0,
        }
    }
}

/// Complete report of one orchestrator run
#[derive(Debug)]
pub struct HarnessReport {
    pub test_name: String,
    pub timestamp: DateTime<Utc>,
    pub duration: Duration,
    pub phases: Vec<PhaseReport>,
    /// Problems that did not fail a phase, such as a failed consumer reset.
    pub warnings: Vec<String>,
}

impl HarnessReport {
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            timestamp: Utc::now(),
            duration: Duration::ZERO,
            phases: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn push(&mut self, report: PhaseReport) {
        self.phases.push(report);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|r| r.phase == phase)
    }

    /// Whether every phase ran and none failed.
    pub fn is_success(&self) -> bool {
        self.phases.len() == Phase::ALL.len()
            && self.phases.iter().all(|r| r.status() != PhaseStatus::Failed)
    }

    pub fn failed_count(&self) -> usize {
        self.phases
            .iter()
            .filter(|r| r.status() == PhaseStatus::Failed)
            .count()
    }

    /// Generate a text report
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("╔════════════════════════════════════════════════════════════╗\n");
        output.push_str("║  Gauntlet Report                                           ║\n");
        output.push_str("╠════════════════════════════════════════════════════════════╣\n");
        output.push_str(&format!("║  Test: {:<51} ║\n", self.test_name));
        output.push_str(&format!(
            "║  Timestamp: {:<46} ║\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&format!(
            "║  Duration: {:<47} ║\n",
            format!("{:?}", self.duration)
        ));
        output.push_str("╠════════════════════════════════════════════════════════════╣\n");

        for report in &self.phases {
            let status_icon = match report.status() {
                PhaseStatus::Passed => "✓",
                PhaseStatus::Failed => "✗",
                PhaseStatus::Skipped => "○",
            };

            output.push_str(&format!(
                "║  {} {:<45} {:>8?}\n",
                status_icon, report.phase, report.duration
            ));
            output.push_str(&format!(
                "║      Assertions: {}  Probes: {}\n",
                report.assertions, report.probe_delta
            ));

            if let Some(message) = report.message() {
                output.push_str(&format!("║      {}\n", message));
            }

            if let Some(error) = report.error() {
                output.push_str(&format!("║      Error: {}\n", error));
            }

            if let Some(PhaseOutcome::ThreadSafety(outcome)) = report.outcome() {
                for failure in &outcome.failures {
                    output.push_str(&format!(
                        "║      User {} failed: {}\n",
                        failure.user, failure.error
                    ));
                }
            }

            output.push_str("╟────────────────────────────────────────────────────────────╢\n");
        }

        for warning in &self.warnings {
            output.push_str(&format!("║  Warning: {}\n", warning));
        }

        if self.is_success() {
            output.push_str("║  Result: ✓ PASSED                                          ║\n");
        } else {
            output.push_str("║  Result: ✗ FAILED                                          ║\n");
        }

        output.push_str("╚════════════════════════════════════════════════════════════╝\n");

        output
    }
}
