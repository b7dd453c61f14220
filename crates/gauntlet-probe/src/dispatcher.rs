//! Single-worker queue that applies counter increments in the background.
//!
//! Increments are applied in submission order by one dedicated thread. A
//! caller returns as soon as its increment is queued, so a read made right
//! after a probe may not see it yet. [`CounterDispatcher::flush`] waits for
//! quiescence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::counter::{Counter, CounterRegistry};
use crate::error::{ProbeError, ProbeResult};

/// Which counter an increment targets.
#[derive(Debug, Clone)]
pub enum Increment {
    Global,
    Anonymous,
    Named(Arc<Counter>),
}

enum Task {
    Apply(Increment),
    Flush(oneshot::Sender<()>),
    Suspend(oneshot::Receiver<()>),
}

/// Background dispatcher for counter increments.
pub struct CounterDispatcher {
    tx: mpsc::UnboundedSender<Task>,
    submitted: Arc<AtomicU64>,
    applied: Arc<AtomicU64>,
    _worker: JoinHandle<()>,
}

impl CounterDispatcher {
    /// Start the worker thread applying increments to `registry`.
    pub fn spawn(registry: Arc<CounterRegistry>) -> ProbeResult<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let applied = Arc::new(AtomicU64::new(0));

        let worker = std::thread::Builder::new()
            .name("gauntlet-probe-dispatcher".to_string())
            .spawn({
                let applied = Arc::clone(&applied);
                move || run_worker(registry, rx, applied)
            })?;

        Ok(Self {
            tx,
            submitted: Arc::new(AtomicU64::new(0)),
            applied,
            _worker: worker,
        })
    }

    /// Queue an increment. Never blocks.
    pub fn submit(&self, increment: Increment) -> ProbeResult<()> {
        self.submitted.fetch_add(1, Ordering::AcqRel);
        self.tx.send(Task::Apply(increment)).map_err(|_| {
            self.submitted.fetch_sub(1, Ordering::AcqRel);
            ProbeError::DispatcherClosed
        })
    }

    /// Number of increments queued but not yet applied.
    pub fn pending(&self) -> u64 {
        self.submitted
            .load(Ordering::Acquire)
            .saturating_sub(self.applied.load(Ordering::Acquire))
    }

    /// Wait until every increment submitted before this call has been applied.
    pub async fn flush(&self) -> ProbeResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(Task::Flush(done_tx))
            .map_err(|_| ProbeError::DispatcherClosed)?;
        done_rx.await.map_err(|_| ProbeError::DispatcherClosed)
    }

    /// Blocking variant of [`flush`](Self::flush) for synchronous callers.
    ///
    /// Must not be called from inside an async task.
    pub fn flush_blocking(&self) -> ProbeResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(Task::Flush(done_tx))
            .map_err(|_| ProbeError::DispatcherClosed)?;
        done_rx
            .blocking_recv()
            .map_err(|_| ProbeError::DispatcherClosed)
    }

    /// Park the worker until the returned guard is dropped.
    ///
    /// Increments submitted meanwhile stay queued, which makes the
    /// eventual-visibility window observable in tests.
    pub fn suspend(&self) -> ProbeResult<SuspendGuard> {
        let (resume_tx, resume_rx) = oneshot::channel();
        self.tx
            .send(Task::Suspend(resume_rx))
            .map_err(|_| ProbeError::DispatcherClosed)?;
        Ok(SuspendGuard {
            _resume: resume_tx,
        })
    }
}

/// Keeps the dispatcher worker parked while alive.
pub struct SuspendGuard {
    _resume: oneshot::Sender<()>,
}

fn run_worker(
    registry: Arc<CounterRegistry>,
    mut rx: mpsc::UnboundedReceiver<Task>,
    applied: Arc<AtomicU64>,
) {
    debug!("counter dispatcher started");
    while let Some(task) = rx.blocking_recv() {
        match task {
            Task::Apply(increment) => {
                match increment {
                    Increment::Global => registry.global().inc(),
                    Increment::Anonymous => registry.anonymous().inc(),
                    Increment::Named(counter) => counter.inc(),
                }
                applied.fetch_add(1, Ordering::AcqRel);
            }
            Task::Flush(done) => {
                let _ = done.send(());
            }
            Task::Suspend(resume) => {
                // Either a resume signal or a dropped guard wakes the worker.
                let _ = resume.blocking_recv();
            }
        }
    }
    debug!("counter dispatcher stopped");
}
