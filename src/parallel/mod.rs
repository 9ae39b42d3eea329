//! Generic worker pool
//!
//! Persistent OS worker threads consuming [`Job`]s from a single unbounded
//! crossbeam queue. The module knows nothing about frames or cameras; it only
//! manages threads, the queue and completion tracking.
//!
//! # Completion
//!
//! [`WorkerPool::has_pending_work`] only reports whether the queue is empty.
//! A job can be dequeued while still running, so callers that need every
//! submitted job to be finished must use [`WorkerPool::wait_idle`], which is
//! backed by a [`CompletionLatch`] counted per job.
//!
//! ```rust
//! use framevote::parallel::{OversubscribePolicy, WorkerPool};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let pool = WorkerPool::new(1, OversubscribePolicy::Clamp).unwrap();
//! let counter = Arc::new(AtomicUsize::new(0));
//! for i in 0..8 {
//!     let counter = Arc::clone(&counter);
//!     pool.execute(format!("job-{i}"), move || {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     })
//!     .unwrap();
//! }
//! pool.wait_idle();
//! assert_eq!(counter.load(Ordering::SeqCst), 8);
//! pool.shutdown();
//! ```

pub mod latch;
pub mod pool;

// Re-export main types for easier access
pub use latch::{CompletionLatch, LatchTicket};
pub use pool::{
    Job, OversubscribePolicy, PoolError, ShutdownReport, WorkerPool, WorkerState, optimal_workers,
};
