use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use thiserror::Error;

use super::latch::{CompletionLatch, LatchTicket};

/// Errors raised by the worker pool. All of them indicate a caller defect.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("a worker pool needs at least one worker")]
    NoWorkers,

    #[error(
        "requested {requested} workers but only {available} hardware threads are available"
    )]
    ExceedsConcurrency { requested: usize, available: usize },

    #[error("attempted to submit an empty job '{0}'")]
    EmptyJob(String),

    #[error("worker pool is shut down")]
    ShutDown,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// What to do when more workers are requested than the machine has hardware threads.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OversubscribePolicy {
    /// Fail construction with [`PoolError::ExceedsConcurrency`].
    #[default]
    Reject,
    /// Silently lower the worker count to the hardware limit.
    Clamp,
}

/// Observable state of a single worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Terminated,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Idle,
            1 => WorkerState::Running,
            _ => WorkerState::Terminated,
        }
    }
}

type Task = Box<dyn FnOnce() + Send + 'static>;

/// A labelled unit of work. A job without a task is "empty" and is refused by
/// [`WorkerPool::submit`].
pub struct Job {
    label: String,
    task: Option<Task>,
}

impl Job {
    pub fn new<F>(label: impl Into<String>, task: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            label: label.into(),
            task: Some(Box::new(task)),
        }
    }

    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            task: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_empty(&self) -> bool {
        self.task.is_none()
    }
}

impl Default for Job {
    fn default() -> Self {
        Job::empty("")
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("label", &self.label)
            .field("empty", &self.is_empty())
            .finish()
    }
}

/// A queued job together with its completion ticket. The ticket is released
/// when the envelope is dropped, whether the job ran or was discarded.
struct Envelope {
    label: String,
    task: Task,
    _ticket: LatchTicket,
}

/// Returned by [`WorkerPool::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Jobs that were still queued when shutdown began and never ran.
    pub dropped_jobs: usize,
}

struct PoolShared {
    terminate: AtomicBool,
    completed: AtomicUsize,
    panicked: AtomicUsize,
    states: Vec<AtomicU8>,
    latch: CompletionLatch,
}

impl PoolShared {
    fn set_state(&self, worker_id: usize, state: WorkerState) {
        self.states[worker_id].store(state as u8, Ordering::Release);
    }
}

/// Context handed to each worker thread
struct WorkerContext {
    worker_id: usize,
    job_rx: Receiver<Envelope>,
    shutdown_rx: Receiver<()>,
    shared: Arc<PoolShared>,
}

/// Fixed-size pool of persistent worker threads fed from one unbounded queue.
///
/// # Shutdown contract
///
/// Shutdown uses a *drop* policy: it raises the terminate signal, wakes every
/// worker and joins them. A job a worker has already dequeued always runs to
/// completion; jobs still sitting in the queue are discarded and counted in
/// the returned [`ShutdownReport`]. Dropping the pool performs the same
/// sequence. Use [`WorkerPool::wait_idle`] first to drain the queue.
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
    job_tx: Option<Sender<Envelope>>,
    job_rx: Receiver<Envelope>,
    shutdown_tx: Option<Sender<()>>,
    shared: Arc<PoolShared>,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("worker_count", &self.worker_count())
            .field("pending_jobs", &self.pending_jobs())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl WorkerPool {
    /// Spawn `workers` threads.
    ///
    /// The count is checked against `num_cpus::get()`; `policy` decides whether
    /// oversubscription is an error or gets clamped.
    pub fn new(workers: usize, policy: OversubscribePolicy) -> Result<Self, PoolError> {
        let worker_count = Self::resolve_worker_count(workers, num_cpus::get(), policy)?;

        let (job_tx, job_rx) = channel::unbounded::<Envelope>();
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(0);

        let shared = Arc::new(PoolShared {
            terminate: AtomicBool::new(false),
            completed: AtomicUsize::new(0),
            panicked: AtomicUsize::new(0),
            states: (0..worker_count)
                .map(|_| AtomicU8::new(WorkerState::Idle as u8))
                .collect(),
            latch: CompletionLatch::new(),
        });

        let mut pool = WorkerPool {
            workers: Vec::with_capacity(worker_count),
            job_tx: Some(job_tx),
            job_rx,
            shutdown_tx: Some(shutdown_tx),
            shared,
        };

        for worker_id in 0..worker_count {
            let ctx = WorkerContext {
                worker_id,
                job_rx: pool.job_rx.clone(),
                shutdown_rx: shutdown_rx.clone(),
                shared: Arc::clone(&pool.shared),
            };

            // On failure `pool` is dropped here, which joins the workers already started.
            let handle = thread::Builder::new()
                .name(format!("framevote-worker-{worker_id}"))
                .spawn(move || worker_loop(ctx))?;
            pool.workers.push(handle);
        }

        tracing::debug!("Started worker pool with {} workers", worker_count);
        Ok(pool)
    }

    /// Build a pool sized from the machine's resources, see [`optimal_workers`].
    ///
    /// The computed count never exceeds `num_cpus::get()`, so no
    /// oversubscription policy applies.
    pub fn with_optimal_workers(
        max_threads: usize,
        thread_percentage: u8,
    ) -> Result<Self, PoolError> {
        Self::new(
            optimal_workers(max_threads, thread_percentage),
            OversubscribePolicy::Clamp,
        )
    }

    fn resolve_worker_count(
        requested: usize,
        available: usize,
        policy: OversubscribePolicy,
    ) -> Result<usize, PoolError> {
        if requested == 0 {
            return Err(PoolError::NoWorkers);
        }
        if requested <= available {
            return Ok(requested);
        }
        match policy {
            OversubscribePolicy::Reject => Err(PoolError::ExceedsConcurrency {
                requested,
                available,
            }),
            OversubscribePolicy::Clamp => {
                tracing::warn!(
                    "Clamping worker count from {} to {} hardware threads",
                    requested,
                    available
                );
                Ok(available.max(1))
            }
        }
    }

    /// Enqueue a job. Never blocks; safe to call from any thread.
    pub fn submit(&self, job: Job) -> Result<(), PoolError> {
        let Job { label, task } = job;
        let Some(task) = task else {
            return Err(PoolError::EmptyJob(label));
        };
        let job_tx = self.job_tx.as_ref().ok_or(PoolError::ShutDown)?;

        let envelope = Envelope {
            label,
            task,
            _ticket: self.shared.latch.ticket(),
        };
        // The pool keeps its own receiver alive, so this only fails after shutdown.
        job_tx.send(envelope).map_err(|_| PoolError::ShutDown)
    }

    /// Convenience wrapper around [`submit`](Self::submit) for a bare closure.
    pub fn execute<F>(&self, label: impl Into<String>, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Job::new(label, task))
    }

    /// Whether any job is waiting in the queue right now.
    ///
    /// This is a snapshot only: an empty queue says nothing about jobs that are
    /// still executing. Use [`wait_idle`](Self::wait_idle) to wait for completion.
    pub fn has_pending_work(&self) -> bool {
        !self.job_rx.is_empty()
    }

    pub fn pending_jobs(&self) -> usize {
        self.job_rx.len()
    }

    /// Jobs submitted but not yet finished (queued or running).
    pub fn in_flight(&self) -> usize {
        self.shared.latch.outstanding()
    }

    /// Block until no submitted job is queued or running.
    ///
    /// Waits for the outstanding count to reach zero, so jobs submitted from
    /// other threads while waiting are waited for as well.
    pub fn wait_idle(&self) {
        self.shared.latch.wait();
    }

    pub fn completed_jobs(&self) -> usize {
        self.shared.completed.load(Ordering::Acquire)
    }

    pub fn panicked_jobs(&self) -> usize {
        self.shared.panicked.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.shared.states.len()
    }

    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.shared
            .states
            .iter()
            .map(|state| WorkerState::from_u8(state.load(Ordering::Acquire)))
            .collect()
    }

    /// Stop the pool. See the type-level docs for the drop policy.
    pub fn shutdown(mut self) -> ShutdownReport {
        self.stop()
    }

    fn stop(&mut self) -> ShutdownReport {
        if self.shutdown_tx.is_none() {
            return ShutdownReport { dropped_jobs: 0 };
        }

        self.shared.terminate.store(true, Ordering::Release);
        // Disconnecting the shutdown channel wakes every worker blocked in `select!`.
        self.shutdown_tx.take();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("Worker thread panicked outside of a job");
            }
        }

        self.job_tx.take();
        let dropped_jobs = self.job_rx.try_iter().count();
        if dropped_jobs > 0 {
            tracing::warn!("Dropped {} queued jobs at shutdown", dropped_jobs);
        }
        tracing::debug!("Worker pool shut down");

        ShutdownReport { dropped_jobs }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(ctx: WorkerContext) {
    let shared = &ctx.shared;

    loop {
        if shared.terminate.load(Ordering::Acquire) {
            break;
        }
        shared.set_state(ctx.worker_id, WorkerState::Idle);

        let envelope = select! {
            recv(ctx.job_rx) -> msg => match msg {
                Ok(envelope) => envelope,
                Err(_) => break,
            },
            recv(ctx.shutdown_rx) -> _ => break,
        };

        shared.set_state(ctx.worker_id, WorkerState::Running);
        let Envelope {
            label,
            task,
            _ticket,
        } = envelope;

        tracing::trace!("worker-{} running '{}'", ctx.worker_id, label);
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            shared.panicked.fetch_add(1, Ordering::AcqRel);
            tracing::error!("Job '{}' panicked on worker-{}", label, ctx.worker_id);
        }
        shared.completed.fetch_add(1, Ordering::AcqRel);
        // `_ticket` drops here, after the counters are updated.
    }

    shared.set_state(ctx.worker_id, WorkerState::Terminated);
}

/// Calculate a worker count from available CPU cores and configuration limits.
///
/// ```text
/// 1. cores = num_cpus::get()
/// 2. by_percentage = max(1, cores * thread_percentage / 100)
/// 3. min(max_threads, by_percentage) if max_threads > 0
/// ```
pub fn optimal_workers(max_threads: usize, thread_percentage: u8) -> usize {
    let available_cores = num_cpus::get();
    let by_percentage = std::cmp::max(1, (available_cores * thread_percentage as usize) / 100);

    if max_threads > 0 {
        std::cmp::min(max_threads, by_percentage)
    } else {
        by_percentage
    }
}
