//! # gauntlet-probe
//!
//! Counters for defensive-programming checks.
//!
//! A probe call increments the global counter and either the anonymous
//! counter or a named one, then evaluates its condition as an internal check
//! that can be switched off. The increments are not applied by the caller:
//! they are queued on a single background worker that applies them in
//! submission order.
//!
//! ```text
//!   caller ──probe()──► [ Global | Named(parser) | Global | Anonymous | ... ]
//!                                        │ FIFO, one worker thread
//!                                        ▼
//!                               ┌──────────────────┐
//!                               │ CounterRegistry  │
//!                               │  global          │
//!                               │  anonymous       │
//!                               │  named: {..}     │
//!                               └──────────────────┘
//! ```
//!
//! Reads are eventually consistent: a value read right after a probe may be
//! stale. Use [`AssertionProbe::flush`] to wait for quiescence.
//!
//! ```rust,no_run
//! use gauntlet_probe::{AssertionProbe, ProbeConfig};
//!
//! let probe = AssertionProbe::new(ProbeConfig::default()).unwrap();
//! probe.probe(1 + 1 == 2);
//! probe.probe_named("parser.lookahead", true);
//! probe.flush_blocking().unwrap();
//! assert_eq!(probe.global_count(), 2);
//! ```

#![deny(unsafe_code)]

pub mod counter;
pub mod dispatcher;
pub mod error;
pub mod probe;

pub use counter::{Counter, CounterRegistry, CounterSnapshot};
pub use dispatcher::{CounterDispatcher, Increment, SuspendGuard};
pub use error::{ProbeError, ProbeResult};
pub use probe::{AssertionProbe, ProbeConfig};
