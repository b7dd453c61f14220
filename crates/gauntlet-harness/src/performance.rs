//! Single-threaded performance run, shared by the performance phase and
//! every simulated user of the thread-safety phase.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::info;

use crate::case::{TestCase, VerifyContext};
use crate::context::HarnessContext;
use crate::error::{ConsumerStage, HarnessError, HarnessResult};
use crate::params::{keys, validate_items, validate_result_message, ParameterMap};
use crate::phase::Phase;

pub const PERFORMANCE_DISABLED: &str = "performance testing has been disabled.";

/// Result of one performance run.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceOutcome {
    pub message: String,
    /// Items counted by the consumer across all calls.
    pub items: u64,
    /// Verification calls made.
    pub iterations: u64,
    pub elapsed: Duration,
    pub disabled: bool,
}

impl PerformanceOutcome {
    fn disabled() -> Self {
        Self {
            message: PERFORMANCE_DISABLED.to_string(),
            items: 0,
            iterations: 0,
            elapsed: Duration::ZERO,
            disabled: true,
        }
    }
}

/// Call `verify` a bounded number of times against one component/data pair.
///
/// Records the item count under `count.for.this.user` and, when the map
/// belongs to a simulated user, adds it to the run's shared counter.
pub fn verify_performance<T: TestCase>(
    case: &T,
    params: &mut ParameterMap,
    component: &T::Component,
    data: &T::Data,
    ctx: &HarnessContext,
) -> HarnessResult<PerformanceOutcome> {
    if params.flag(keys::DISABLE_PERFORMANCE_TEST) {
        info!("{PERFORMANCE_DISABLED}");
        return Ok(PerformanceOutcome::disabled());
    }

    let template = validate_result_message(params, Phase::Performance)?;
    let items = validate_items(params, Phase::Performance)?;

    let start = Instant::now();
    let counter = AtomicU64::new(0);
    let iterations = ctx.derivation().iterations(items);
    {
        let verify_ctx = VerifyContext::new(&counter, ctx.tracker());
        for _ in 0..iterations {
            case.verify(params, component, data, &verify_ctx)
                .map_err(|e| HarnessError::consumer(ConsumerStage::Verify, e))?;
        }
    }

    let counted = counter.load(Ordering::Relaxed);
    params.insert(keys::COUNT_FOR_THIS_USER, counted);
    if params.is_thread_safety() {
        ctx.shared().add(counted);
    }

    let elapsed = start.elapsed();
    let message = template.render(&[counted.into(), elapsed.as_secs_f64().into()]);
    info!(user = params.user_id().unwrap_or_default(), "{message}");

    Ok(PerformanceOutcome {
        message,
        items: counted,
        iterations,
        elapsed,
        disabled: false,
    })
}
