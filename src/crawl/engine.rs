//! Fixed-size worker pool fed through a bounded channel.
//!
//! # Concurrency Model
//!
//! - `workers` Tokio tasks share one `mpsc::Receiver` behind an async mutex
//! - Submissions wait when the channel holds `queue_capacity` tasks, which
//!   throttles discovery instead of letting queued tasks pile up in memory
//! - Closing the pool drops the sender; each worker exits once the channel
//!   is empty, and [`WorkerPool::drain`] joins every worker
//! - Task failures stay inside the worker: they are counted, never propagated
//! - A task that panics is counted as failed and its worker moves on to the
//!   next task, so the pool never shrinks below `workers`

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::FutureExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use super::task::{ArtifactTask, DownloadResult, TaskRunner};

/// Minimum allowed worker count.
const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
const MAX_WORKERS: usize = 100;

/// Default worker count.
pub const DEFAULT_WORKERS: usize = 50;

/// Error type for worker pool operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkers {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Queue capacity of zero cannot hold a single task.
    #[error("invalid queue capacity {value}: must be at least 1")]
    InvalidQueueCapacity {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// Outcome counters for one run.
///
/// Uses atomic counters for thread-safe updates from concurrent workers.
#[derive(Debug, Default)]
pub struct DownloadStats {
    saved: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    retried: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of artifacts saved.
    #[must_use]
    pub fn saved(&self) -> usize {
        self.saved.load(Ordering::SeqCst)
    }

    /// Returns the number of items skipped for lack of an artifact link.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// Returns the number of abandoned tasks.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the number of extra attempts made beyond each task's first.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    /// Records one terminal task outcome.
    pub fn record(&self, result: &DownloadResult) {
        let counter = match result {
            DownloadResult::Saved { .. } => &self.saved,
            DownloadResult::Skipped { .. } => &self.skipped,
            DownloadResult::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);

        let extra = result.attempts().saturating_sub(1) as usize;
        if extra > 0 {
            self.retried.fetch_add(extra, Ordering::SeqCst);
        }
    }

    /// Counts a task that panicked before reaching a result.
    fn record_panicked(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Self {
        Self {
            saved: AtomicUsize::new(self.saved()),
            skipped: AtomicUsize::new(self.skipped()),
            failed: AtomicUsize::new(self.failed()),
            retried: AtomicUsize::new(self.retried()),
        }
    }
}

/// Sizing for a [`WorkerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Tasks that may wait in the channel before submission blocks.
    pub queue_capacity: usize,
}

impl PoolConfig {
    /// Creates a config with the queue sized at twice the worker count.
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            queue_capacity: workers.saturating_mul(2).max(1),
        }
    }

    /// Checks both values are in range.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidWorkers`] or
    /// [`EngineError::InvalidQueueCapacity`].
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&self.workers) {
            return Err(EngineError::InvalidWorkers {
                value: self.workers,
            });
        }
        if self.queue_capacity == 0 {
            return Err(EngineError::InvalidQueueCapacity {
                value: self.queue_capacity,
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::with_workers(DEFAULT_WORKERS)
    }
}

/// Running pool of workers executing [`ArtifactTask`]s.
#[derive(Debug)]
pub struct WorkerPool {
    sender: mpsc::Sender<ArtifactTask>,
    workers: JoinSet<()>,
    stats: Arc<DownloadStats>,
}

impl WorkerPool {
    /// Spawns `config.workers` workers on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if `config` is out of range.
    #[instrument(level = "debug", skip(runner))]
    pub fn spawn(config: PoolConfig, runner: Arc<TaskRunner>) -> Result<Self, EngineError> {
        config.validate()?;

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let stats = Arc::new(DownloadStats::new());
        let mut workers = JoinSet::new();

        for worker_id in 0..config.workers {
            workers.spawn(worker_loop(
                worker_id,
                Arc::clone(&receiver),
                Arc::clone(&runner),
                Arc::clone(&stats),
            ));
        }

        debug!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "worker pool started"
        );

        Ok(Self {
            sender,
            workers,
            stats,
        })
    }

    /// Returns a handle that can submit tasks into the pool.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<ArtifactTask> {
        self.sender.clone()
    }

    /// Stops accepting work and waits for every queued and in-flight task.
    ///
    /// Other clones of [`sender`](Self::sender) must be dropped first, or
    /// the workers keep waiting for more tasks.
    pub async fn drain(self) -> DownloadStats {
        let Self {
            sender,
            mut workers,
            stats,
        } = self;
        drop(sender);

        debug!(workers = workers.len(), "waiting for workers to finish");
        while let Some(joined) = workers.join_next().await {
            // A panicking task is logged; it does not take the other workers down
            if let Err(e) = joined {
                warn!(error = %e, "worker panicked");
            }
        }

        // Every worker has been joined, so this is normally the last reference
        let stats = Arc::try_unwrap(stats).unwrap_or_else(|shared| shared.snapshot());

        info!(
            saved = stats.saved(),
            skipped = stats.skipped(),
            failed = stats.failed(),
            retried = stats.retried(),
            "worker pool drained"
        );
        stats
    }
}

async fn worker_loop(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<ArtifactTask>>>,
    runner: Arc<TaskRunner>,
    stats: Arc<DownloadStats>,
) {
    loop {
        // The lock is released before the task runs
        let next = receiver.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };

        match run_guarded(task.seq, runner.run(&task)).await {
            Some(result) => stats.record(&result),
            None => stats.record_panicked(),
        }
    }
    debug!(worker_id, "worker exiting");
}

/// Runs one task, turning a panic into `None` so the calling worker survives.
async fn run_guarded<F>(seq: u64, task: F) -> Option<DownloadResult>
where
    F: Future<Output = DownloadResult>,
{
    match AssertUnwindSafe(task).catch_unwind().await {
        Ok(result) => Some(result),
        Err(_) => {
            error!(task = seq, "task panicked, counting it as failed");
            None
        }
    }
}
