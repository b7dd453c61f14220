//! # gauntlet-harness
//!
//! Runs a component under test through three escalating phases:
//!
//! 1. **Functional**: one verification call against a fresh component and
//!    fresh data.
//! 2. **Performance**: a bounded number of calls against one pair, timed and
//!    reported through a result template.
//! 3. **Thread safety**: a random number of simulated users, each running a
//!    performance sub-phase in parallel on the blocking pool, aggregated into
//!    one report.
//!
//! Consumers implement [`TestCase`] and hand it to a [`PhaseOrchestrator`].
//! Checks made through the [`VerifyContext`] are counted per phase, and the
//! growth of the [`gauntlet_probe`] global counter is reported alongside.
//!
//! ```rust,no_run
//! use gauntlet_harness::{
//!     template, ConsumerResult, HarnessConfig, ParameterMap, PhaseOrchestrator, TestCase,
//!     VerifyContext,
//! };
//! use gauntlet_probe::{AssertionProbe, ProbeConfig};
//!
//! struct Reverse;
//!
//! impl TestCase for Reverse {
//!     type Component = ();
//!     type Data = Vec<u32>;
//!
//!     fn perf_result_message(&self) -> String {
//!         template::performance_message("reversed", "lists")
//!     }
//!
//!     fn thread_safety_result_message(&self) -> String {
//!         template::thread_safety_message("reversed", "lists")
//!     }
//!
//!     fn generate_test_data(&self, _params: &ParameterMap) -> ConsumerResult<Vec<u32>> {
//!         Ok((0..100).collect())
//!     }
//!
//!     fn component_under_test(&self) -> ConsumerResult<()> {
//!         Ok(())
//!     }
//!
//!     fn verify(
//!         &self,
//!         _params: &ParameterMap,
//!         _component: &(),
//!         data: &Vec<u32>,
//!         ctx: &VerifyContext<'_>,
//!     ) -> ConsumerResult<()> {
//!         let twice: Vec<u32> = data.iter().rev().rev().copied().collect();
//!         ctx.check_eq("double reverse", data, &twice)?;
//!         ctx.add_items(1);
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() {
//! let probe = AssertionProbe::new(ProbeConfig::default()).unwrap();
//! let orchestrator = PhaseOrchestrator::new(Reverse, probe, HarnessConfig::default()).unwrap();
//! let report = orchestrator.run().await;
//! println!("{}", report.to_text());
//! # }
//! ```

#![deny(unsafe_code)]

pub mod case;
pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod params;
pub mod performance;
pub mod phase;
pub mod report;
pub mod simulator;
pub mod template;
pub mod tracker;

pub use case::{TestCase, VerifyContext};
pub use config::HarnessConfig;
pub use context::{HarnessContext, SharedCounter};
pub use error::{
    BoxError, ConsumerResult, ConsumerStage, ContractViolation, HarnessError, HarnessResult,
};
pub use orchestrator::PhaseOrchestrator;
pub use params::{keys, ParameterDerivation, ParameterMap, MAX_SIMULTANEOUS_USERS};
pub use performance::{verify_performance, PerformanceOutcome};
pub use phase::Phase;
pub use report::{HarnessReport, PhaseOutcome, PhaseReport, PhaseStatus};
pub use simulator::{ConcurrentUserSimulator, ThreadSafetyOutcome, UserFailure, UserReport};
pub use template::{ResultTemplate, TemplateArg};
pub use tracker::AssertionTracker;
