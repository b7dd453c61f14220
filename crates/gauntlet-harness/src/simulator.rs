//! Thread-safety phase: many simulated users running performance sub-phases
//! in parallel against their own component/data pairs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::case::TestCase;
use crate::context::HarnessContext;
use crate::error::{ConsumerStage, HarnessError, HarnessResult};
use crate::params::{keys, validate_result_message, validate_user_count, ParameterMap};
use crate::performance::{verify_performance, PerformanceOutcome};
use crate::phase::Phase;

pub const THREAD_SAFETY_DISABLED: &str = "thread safety testing has been disabled.";

/// A simulated user that finished its performance sub-phase.
#[derive(Debug, Clone)]
pub struct UserReport {
    pub user: String,
    pub message: String,
    pub items: u64,
}

/// A simulated user that did not finish. Never fails the phase.
#[derive(Debug)]
pub struct UserFailure {
    pub user: String,
    pub error: HarnessError,
}

/// Aggregated result of the thread-safety phase.
#[derive(Debug)]
pub struct ThreadSafetyOutcome {
    pub message: String,
    pub users: u64,
    /// Sum of every finished user's item count.
    pub aggregate: u64,
    pub elapsed: Duration,
    pub completed: Vec<UserReport>,
    pub failures: Vec<UserFailure>,
    pub disabled: bool,
}

impl ThreadSafetyOutcome {
    fn disabled() -> Self {
        Self {
            message: THREAD_SAFETY_DISABLED.to_string(),
            users: 0,
            aggregate: 0,
            elapsed: Duration::ZERO,
            completed: Vec::new(),
            failures: Vec::new(),
            disabled: true,
        }
    }
}

/// Fans simulated users out onto the blocking worker pool.
#[derive(Debug, Clone, Default)]
pub struct ConcurrentUserSimulator {
    pool: Option<Handle>,
    timeout: Option<Duration>,
}

impl ConcurrentUserSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run users on `pool` instead of the runtime driving [`run`](Self::run).
    pub fn with_pool(mut self, pool: Handle) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Record a user as failed once it has run for `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Simulate the users described by a thread-safety parameter map.
    ///
    /// Contract violations in `params` fail the call; anything that goes
    /// wrong inside a single user is recorded in
    /// [`ThreadSafetyOutcome::failures`].
    pub async fn run<T: TestCase>(
        &self,
        case: Arc<T>,
        ctx: Arc<HarnessContext>,
        params: &ParameterMap,
    ) -> HarnessResult<ThreadSafetyOutcome> {
        if params.flag(keys::DISABLE_THREAD_SAFETY_TEST) {
            info!("{THREAD_SAFETY_DISABLED}");
            return Ok(ThreadSafetyOutcome::disabled());
        }

        let users = validate_user_count(params)?;
        let template = validate_result_message(params, Phase::ThreadSafety)?;
        ctx.probe().probe_named("simulator.users", users >= 1);

        ctx.shared().reset();
        let start = Instant::now();

        let handles: Vec<(String, JoinHandle<HarnessResult<PerformanceOutcome>>)> = (0..users)
            .map(|i| {
                let user = format!("user-{i}");
                let handle =
                    self.spawn_user(Arc::clone(&case), Arc::clone(&ctx), user.clone(), users);
                (user, handle)
            })
            .collect();

        let timeout = self.timeout;
        let settled = join_all(handles.into_iter().map(|(user, handle)| async move {
            let result = match timeout {
                Some(after) => match tokio::time::timeout(after, handle).await {
                    Ok(joined) => joined.map_err(|e| HarnessError::from_join(user.clone(), e)),
                    Err(_) => Err(HarnessError::TimedOut {
                        user: user.clone(),
                        after,
                    }),
                },
                None => handle
                    .await
                    .map_err(|e| HarnessError::from_join(user.clone(), e)),
            };
            (user, result.and_then(|inner| inner))
        }))
        .await;

        let mut completed = Vec::with_capacity(settled.len());
        let mut failures = Vec::new();
        for (user, result) in settled {
            match result {
                Ok(outcome) => completed.push(UserReport {
                    user,
                    message: outcome.message,
                    items: outcome.items,
                }),
                Err(error) => {
                    warn!(%user, %error, "simulated user failed");
                    failures.push(UserFailure { user, error });
                }
            }
        }

        let aggregate = ctx.shared().get();
        let elapsed = start.elapsed();
        let message = template.render(&[
            users.into(),
            aggregate.into(),
            elapsed.as_secs_f64().into(),
        ]);
        info!(
            completed = completed.len(),
            failed = failures.len(),
            "{message}"
        );

        Ok(ThreadSafetyOutcome {
            message,
            users,
            aggregate,
            elapsed,
            completed,
            failures,
            disabled: false,
        })
    }

    fn spawn_user<T: TestCase>(
        &self,
        case: Arc<T>,
        ctx: Arc<HarnessContext>,
        user: String,
        users: u64,
    ) -> JoinHandle<HarnessResult<PerformanceOutcome>> {
        let task = move || run_user(case.as_ref(), ctx.as_ref(), user, users);
        match &self.pool {
            Some(pool) => pool.spawn_blocking(task),
            None => tokio::task::spawn_blocking(task),
        }
    }
}

/// One simulated user: own parameters, own data, own component.
fn run_user<T: TestCase>(
    case: &T,
    ctx: &HarnessContext,
    user: String,
    users: u64,
) -> HarnessResult<PerformanceOutcome> {
    let mut params = ctx.derivation().performance(case);
    params.insert(keys::USER_ID, user);
    params.insert(keys::NUMBER_OF_SIMULTANEOUS_USERS, users);

    let data = case
        .generate_test_data(&params)
        .map_err(|e| HarnessError::consumer(ConsumerStage::GenerateTestData, e))?;
    let component = case
        .component_under_test()
        .map_err(|e| HarnessError::consumer(ConsumerStage::ComponentUnderTest, e))?;

    verify_performance(case, &mut params, &component, &data, ctx)
}
