//! Worker thread implementation

use crate::core::{BoxedWorkItem, PoolError, Result};
use crate::pool::worker_pool::PoolShared;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of work items executed to completion
    pub items_processed: AtomicU64,
    /// Total number of work items that panicked
    pub items_panicked: AtomicU64,
    /// Total time spent executing items (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment items processed counter
    pub fn increment_processed(&self) {
        self.items_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment items panicked counter
    pub fn increment_panicked(&self) {
        self.items_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Add processing time
    pub fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total items processed
    pub fn get_items_processed(&self) -> u64 {
        self.items_processed.load(Ordering::Relaxed)
    }

    /// Get total items panicked
    pub fn get_items_panicked(&self) -> u64 {
        self.items_panicked.load(Ordering::Relaxed)
    }

    /// Fold another worker's counters into this one
    pub fn merge(&self, other: &WorkerStats) {
        self.items_processed.fetch_add(
            other.items_processed.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.items_panicked.fetch_add(
            other.items_panicked.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.total_processing_time_us.fetch_add(
            other.total_processing_time_us.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
    }

    /// Get average processing time per item in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.items_processed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// Lifecycle state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerState {
    /// Accepting and executing work items
    Active,
    /// Told to stop; will exit without draining its queue
    ShuttingDown,
    /// Run loop has exited
    Terminated,
}

/// Queue and state of a worker, guarded by the worker's own lock.
///
/// When both the pool lock and a worker lock are needed, the pool lock is
/// always taken first. The run loop only ever takes its own lock.
struct WorkerInner {
    queue: VecDeque<BoxedWorkItem>,
    state: WorkerState,
    /// True while an item popped from the queue is being executed. Counted
    /// into the load so placement sees in-flight work, and used to skip
    /// workers that are not parked when picking a reclamation victim.
    busy: bool,
}

struct WorkerShared {
    id: usize,
    inner: Mutex<WorkerInner>,
    wake: Condvar,
    stats: Arc<WorkerStats>,
}

/// A worker thread owned by a [`WorkerPool`](crate::pool::WorkerPool).
///
/// Each worker runs a loop that executes items from its private FIFO.
/// Workers are created, fed and torn down exclusively by their pool.
pub struct Worker {
    shared: Arc<WorkerShared>,
    thread: Option<thread::JoinHandle<()>>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.shared.id)
            .field("load", &self.load())
            .finish()
    }
}

impl Worker {
    /// Create and start a new worker.
    ///
    /// The worker holds only a weak reference to the pool so that a pool
    /// being dropped never keeps itself alive through its own threads.
    pub(crate) fn spawn(
        id: usize,
        thread_name_prefix: &str,
        pool: Weak<PoolShared>,
    ) -> Result<Self> {
        let shared = Arc::new(WorkerShared {
            id,
            inner: Mutex::new(WorkerInner {
                queue: VecDeque::new(),
                state: WorkerState::Active,
                busy: false,
            }),
            wake: Condvar::new(),
            stats: Arc::new(WorkerStats::new()),
        });
        let shared_clone = Arc::clone(&shared);

        let thread = thread::Builder::new()
            .name(format!("{}-{}", thread_name_prefix, id))
            .spawn(move || {
                Self::run(shared_clone, pool);
            })
            .map_err(|e| PoolError::spawn_with_source(id, "cannot create thread", e))?;

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.shared.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.shared.stats)
    }

    /// Number of pending items, counting an item currently executing.
    pub fn load(&self) -> usize {
        let inner = self.shared.inner.lock();
        inner.queue.len() + usize::from(inner.busy)
    }

    /// True if the worker is accepting work.
    pub(crate) fn is_active(&self) -> bool {
        self.shared.inner.lock().state == WorkerState::Active
    }

    /// True if the worker is active with no queued or executing item.
    pub(crate) fn is_idle(&self) -> bool {
        let inner = self.shared.inner.lock();
        inner.state == WorkerState::Active && inner.queue.is_empty() && !inner.busy
    }

    /// Queue an item on this worker and wake its run loop.
    pub(crate) fn assign(&self, item: BoxedWorkItem) {
        let mut inner = self.shared.inner.lock();
        debug_assert_eq!(inner.state, WorkerState::Active);
        inner.queue.push_back(item);
        drop(inner);
        self.shared.wake.notify_one();
    }

    /// Signal the worker to stop. Queued items will be dropped unexecuted.
    pub(crate) fn stop(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.state == WorkerState::Active {
            inner.state = WorkerState::ShuttingDown;
        }
        drop(inner);
        self.shared.wake.notify_all();
    }

    /// Join the worker thread, waiting at most `timeout`.
    ///
    /// On timeout the thread handle is discarded, detaching the thread;
    /// the caller logs and proceeds (best-effort teardown).
    pub(crate) fn join_timeout(mut self, timeout: Duration) -> Result<()> {
        let id = self.shared.id;
        if let Some(handle) = self.thread.take() {
            let start = Instant::now();
            while !handle.is_finished() {
                if start.elapsed() >= timeout {
                    return Err(PoolError::join_timeout(id, timeout.as_millis() as u64));
                }
                thread::sleep(Duration::from_millis(10));
            }
            if let Err(panic_info) = handle.join() {
                let panic_msg = panic_message(&panic_info);
                log::error!("worker {} panicked during shutdown: {}", id, panic_msg);
            }
        }
        Ok(())
    }

    /// Main worker loop.
    ///
    /// Executes one item at a time from the private queue, parking on the
    /// condvar while the queue is empty. On a stop signal the loop exits
    /// immediately; remaining items are dropped without running.
    fn run(shared: Arc<WorkerShared>, pool: Weak<PoolShared>) {
        log::debug!("worker {} started", shared.id);

        loop {
            let mut item = {
                let mut inner = shared.inner.lock();
                loop {
                    if inner.state == WorkerState::ShuttingDown {
                        let dropped = inner.queue.len();
                        inner.queue.clear();
                        inner.state = WorkerState::Terminated;
                        drop(inner);
                        if dropped > 0 {
                            log::debug!(
                                "worker {} dropped {} unexecuted item(s) at shutdown",
                                shared.id,
                                dropped
                            );
                            if let Some(pool) = pool.upgrade() {
                                pool.notify_items_dropped(shared.id, dropped);
                            }
                        }
                        log::debug!(
                            "worker {} shutting down after {} item(s)",
                            shared.id,
                            shared.stats.get_items_processed()
                        );
                        return;
                    }
                    if let Some(item) = inner.queue.pop_front() {
                        inner.busy = true;
                        break item;
                    }
                    shared.wake.wait(&mut inner);
                }
            };

            Self::execute_item(shared.id, &mut item, &shared.stats);
            drop(item);

            // With an empty queue, let the pool retire some other idle
            // worker. `busy` stays set until this returns so a concurrent
            // reclamation never picks this thread as its victim.
            let queue_empty = shared.inner.lock().queue.is_empty();
            if queue_empty {
                if let Some(pool) = pool.upgrade() {
                    pool.reclaim_idle(shared.id);
                }
            }
            shared.inner.lock().busy = false;
        }
    }

    /// Execute a single item with panic protection
    fn execute_item(id: usize, item: &mut BoxedWorkItem, stats: &WorkerStats) {
        let start = Instant::now();

        let panic_result = catch_unwind(AssertUnwindSafe(|| item.run()));

        let elapsed_us = start.elapsed().as_micros() as u64;

        match panic_result {
            Ok(()) => {
                stats.increment_processed();
            }
            Err(panic_info) => {
                let panic_msg = panic_message(&panic_info);
                log::error!("worker {}: work item panicked: {}", id, panic_msg);
                stats.increment_panicked();
            }
        }

        stats.add_processing_time(elapsed_us);
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
