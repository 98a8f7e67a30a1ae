//! Persistent worker pool, generation-based cancellation, and the messages
//! tasks send back to the scheduling thread.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::iteration_buffer::SegmentData;

/// Pool size bounds when derived from hardware parallelism.
pub const MIN_WORKERS: usize = 2;
pub const MAX_WORKERS: usize = 16;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Tracks the current render generation for cancellation and progress.
///
/// Advancing the generation tells every in-flight task that its result is
/// stale; tasks poll it between scanlines. The progress counters let a host
/// display a progress bar.
#[derive(Debug)]
pub struct RenderCancel {
    generation: AtomicU64,
    progress_done: AtomicUsize,
    progress_total: AtomicUsize,
}

impl RenderCancel {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            progress_done: AtomicUsize::new(0),
            progress_total: AtomicUsize::new(0),
        }
    }

    /// Invalidate in-flight work by advancing the generation. Returns the new
    /// generation.
    pub fn cancel(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Read the current generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Reset progress for a new phase with `total` work units.
    pub fn reset_progress(&self, total: usize) {
        self.progress_total.store(total, Ordering::Relaxed);
        self.progress_done.store(0, Ordering::Relaxed);
    }

    /// Add `n` completed work units.
    pub fn add_progress(&self, n: usize) {
        self.progress_done.fetch_add(n, Ordering::Relaxed);
    }

    /// Read the current progress as `(done, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.progress_done.load(Ordering::Relaxed),
            self.progress_total.load(Ordering::Relaxed),
        )
    }
}

impl Default for RenderCancel {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Task messages
// ---------------------------------------------------------------------------

/// Which half of a segment's pipeline a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compute,
    Render,
}

/// Identifies the slot a task belongs to, so failures can be attributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskOrigin {
    pub worker_id: u32,
    pub stage: Stage,
    pub generation: u64,
}

/// Everything a task can report.
#[derive(Debug)]
pub enum TaskOutcome {
    Computed {
        generation: u64,
        data: SegmentData,
    },
    Progress {
        generation: u64,
        worker_id: u32,
        lines: u32,
    },
    /// Pixels plus the iteration data they were coloured from, returned so
    /// the scheduler can keep the full-resolution copy for redraws.
    Rendered {
        generation: u64,
        pixels: RenderBuffer,
        data: SegmentData,
    },
    /// The task noticed its generation was superseded and gave up.
    Stale {
        origin: TaskOrigin,
    },
    Failed {
        origin: TaskOrigin,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// A fixed-size set of threads running segment tasks.
///
/// Tasks are fire-and-forget closures; their outcomes arrive on an internal
/// channel drained by [`WorkerPool::poll`], so the scheduling thread never
/// blocks on a task.
pub struct WorkerPool {
    pool: Arc<rayon::ThreadPool>,
    threads: usize,
    tx: mpsc::Sender<TaskOutcome>,
    rx: mpsc::Receiver<TaskOutcome>,
}

impl WorkerPool {
    /// Build a pool of `threads` workers, or [`default_threads`] when `None`.
    ///
    /// [`default_threads`]: Self::default_threads
    pub fn new(threads: Option<usize>) -> crate::Result<Self> {
        let threads = threads.unwrap_or_else(Self::default_threads).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("segment-worker-{i}"))
            .build()
            .map_err(|e| RenderError::PoolBuild(e.to_string()))?;
        let (tx, rx) = mpsc::channel();
        debug!(threads, "Worker pool started");
        Ok(Self {
            pool: Arc::new(pool),
            threads,
            tx,
            rx,
        })
    }

    /// Hardware parallelism clamped to `MIN_WORKERS..=MAX_WORKERS`.
    pub fn default_threads() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .clamp(MIN_WORKERS, MAX_WORKERS)
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `job` on a worker. The job gets a sender for intermediate
    /// messages and returns its final outcome. A panic inside the job
    /// becomes [`TaskOutcome::Failed`].
    pub fn submit<F>(&self, origin: TaskOrigin, job: F)
    where
        F: FnOnce(&mpsc::Sender<TaskOutcome>) -> TaskOutcome + Send + 'static,
    {
        let tx = self.tx.clone();
        self.pool.spawn(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| job(&tx))).unwrap_or_else(|payload| {
                let message = panic_message(payload);
                error!(
                    worker_id = origin.worker_id,
                    stage = ?origin.stage,
                    %message,
                    "Segment task panicked"
                );
                TaskOutcome::Failed { origin, message }
            });
            // The receiver only goes away with the pool itself.
            let _ = tx.send(outcome);
        });
    }

    /// Drain every outcome that has arrived so far.
    pub fn poll(&self) -> Vec<TaskOutcome> {
        self.rx.try_iter().collect()
    }

    /// Block up to `timeout` for the next outcome.
    pub fn wait(&self, timeout: Duration) -> Option<TaskOutcome> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Run a blocking data-parallel job on this pool's threads.
    pub fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Shared handle to the underlying thread pool, for jobs that outlive a
    /// borrow of `self` (the poster thread).
    pub(crate) fn handle(&self) -> Arc<rayon::ThreadPool> {
        Arc::clone(&self.pool)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
