//! Drives a test case through the functional, performance and thread-safety
//! phases in order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use gauntlet_probe::AssertionProbe;
use tokio::runtime::Handle;
use tracing::{error, info, warn};

use crate::case::{TestCase, VerifyContext};
use crate::config::HarnessConfig;
use crate::context::HarnessContext;
use crate::error::{ConsumerStage, HarnessError, HarnessResult};
use crate::performance::verify_performance;
use crate::phase::Phase;
use crate::report::{HarnessReport, PhaseOutcome, PhaseReport};
use crate::simulator::ConcurrentUserSimulator;

/// Runs the three phases for one test case.
pub struct PhaseOrchestrator<T: TestCase> {
    case: Arc<T>,
    ctx: Arc<HarnessContext>,
    simulator: ConcurrentUserSimulator,
    pool: Option<Handle>,
}

impl<T: TestCase> PhaseOrchestrator<T> {
    /// Create an orchestrator; fails if `config` is invalid.
    pub fn new(case: T, probe: AssertionProbe, config: HarnessConfig) -> HarnessResult<Self> {
        Self::from_arc(Arc::new(case), probe, config)
    }

    /// Like [`new`](Self::new), for a case the caller keeps a handle to.
    pub fn from_arc(
        case: Arc<T>,
        probe: AssertionProbe,
        config: HarnessConfig,
    ) -> HarnessResult<Self> {
        let simulator = ConcurrentUserSimulator::new().with_timeout(config.user_timeout());
        Ok(Self {
            case,
            ctx: Arc::new(HarnessContext::new(config, probe)?),
            simulator,
            pool: None,
        })
    }

    /// Run consumer callbacks on `pool` instead of the calling runtime.
    pub fn with_pool(mut self, pool: Handle) -> Self {
        self.simulator = self.simulator.with_pool(pool.clone());
        self.pool = Some(pool);
        self
    }

    pub fn case(&self) -> &Arc<T> {
        &self.case
    }

    pub fn context(&self) -> &Arc<HarnessContext> {
        &self.ctx
    }

    /// Run every phase once, resetting the case between phases.
    ///
    /// A failed phase is recorded and the next one still runs.
    pub async fn run(&self) -> HarnessReport {
        let start = Instant::now();
        let mut report = HarnessReport::new(self.case.name());

        let mut next = Some(Phase::Functional);
        while let Some(phase) = next {
            report.push(self.run_phase(phase).await);
            next = phase.next();

            if next.is_some() {
                if let Err(e) = self.reset_case().await {
                    warn!(%phase, error = %e, "reset between phases failed");
                    report.add_warning(format!("reset after the {phase} test failed: {e}"));
                }
            }
        }

        report.duration = start.elapsed();
        report
    }

    /// Run the phases and panic with the text report unless all passed.
    pub async fn assert_passes(&self) -> HarnessReport {
        let report = self.run().await;

        if !report.is_success() {
            panic!(
                "Test case '{}' did not pass:\n{}",
                report.test_name,
                report.to_text()
            );
        }

        report
    }

    /// Run a single phase and report its counts.
    pub async fn run_phase(&self, phase: Phase) -> PhaseReport {
        self.ctx.tracker().reset();
        self.ctx.shared().reset();
        // Probes queued by the previous phase or reset belong before the baseline.
        self.flush_probes().await;
        let baseline = self.ctx.probe().global_count();

        info!("starting '{}' test for '{}'.", phase, self.case.name());
        let start = Instant::now();

        let result = match phase {
            Phase::Functional => self.functional().await,
            Phase::Performance => self.performance().await,
            Phase::ThreadSafety => self.thread_safety().await,
        };
        let duration = start.elapsed();

        self.flush_probes().await;
        let probe_delta = self.ctx.probe().global_count().saturating_sub(baseline);
        let assertions = self.ctx.tracker().count();

        info!("{probe_delta} runtime defensive programming assertions were evaluated.");
        info!("{assertions} assertions were evaluated during the {phase} test.");

        match &result {
            Ok(outcome) => {
                if let Some(message) = outcome.message() {
                    info!(%phase, "{message}");
                }
            }
            Err(e) => error!(%phase, error = %e, "phase failed"),
        }

        PhaseReport {
            phase,
            result,
            assertions,
            probe_delta,
            duration,
        }
    }

    async fn functional(&self) -> HarnessResult<PhaseOutcome> {
        self.blocking("functional test", |case, ctx| {
            let params = ctx.derivation().functional(case);
            let component = case
                .component_under_test()
                .map_err(|e| HarnessError::consumer(ConsumerStage::ComponentUnderTest, e))?;
            let data = case
                .generate_test_data(&params)
                .map_err(|e| HarnessError::consumer(ConsumerStage::GenerateTestData, e))?;

            let items = AtomicU64::new(0);
            case.verify(&params, &component, &data, &VerifyContext::new(&items, ctx.tracker()))
                .map_err(|e| HarnessError::consumer(ConsumerStage::Verify, e))?;

            Ok(PhaseOutcome::Functional {
                items: items.load(Ordering::Relaxed),
            })
        })
        .await
    }

    async fn performance(&self) -> HarnessResult<PhaseOutcome> {
        self.blocking("performance test", |case, ctx| {
            let mut params = ctx.derivation().performance(case);
            let component = case
                .component_under_test()
                .map_err(|e| HarnessError::consumer(ConsumerStage::ComponentUnderTest, e))?;
            let data = case
                .generate_test_data(&params)
                .map_err(|e| HarnessError::consumer(ConsumerStage::GenerateTestData, e))?;

            verify_performance(case, &mut params, &component, &data, ctx)
                .map(PhaseOutcome::Performance)
        })
        .await
    }

    async fn thread_safety(&self) -> HarnessResult<PhaseOutcome> {
        // The phase-level pair is created and checked like the other phases;
        // every simulated user then builds its own.
        let params = self
            .blocking("thread safety test", |case, ctx| {
                let params = ctx.derivation().thread_safety(case);
                case.component_under_test()
                    .map_err(|e| HarnessError::consumer(ConsumerStage::ComponentUnderTest, e))?;
                case.generate_test_data(&params)
                    .map_err(|e| HarnessError::consumer(ConsumerStage::GenerateTestData, e))?;
                Ok(params)
            })
            .await?;

        self.simulator
            .run(Arc::clone(&self.case), Arc::clone(&self.ctx), &params)
            .await
            .map(PhaseOutcome::ThreadSafety)
    }

    async fn flush_probes(&self) {
        if self.ctx.config().flush_probes {
            if let Err(e) = self.ctx.probe().flush().await {
                warn!(error = %e, "probe counts may be stale");
            }
        }
    }

    async fn reset_case(&self) -> HarnessResult<()> {
        self.blocking("reset", |case, _| {
            case.reset()
                .map_err(|e| HarnessError::consumer(ConsumerStage::Reset, e))
        })
        .await
    }

    /// Run `f` on the blocking pool; a panic becomes a [`HarnessError::Panicked`].
    async fn blocking<R, F>(&self, context: &str, f: F) -> HarnessResult<R>
    where
        F: FnOnce(&T, &HarnessContext) -> HarnessResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let case = Arc::clone(&self.case);
        let ctx = Arc::clone(&self.ctx);
        let task = move || f(case.as_ref(), ctx.as_ref());

        let handle = match &self.pool {
            Some(pool) => pool.spawn_blocking(task),
            None => tokio::task::spawn_blocking(task),
        };
        handle.await.map_err(|e| HarnessError::from_join(context, e))?
    }
}
