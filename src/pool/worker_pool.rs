//! Worker pool with load-aware placement

use crate::core::{BoxedWorkItem, ClosureWork, PoolError, Result, WorkItem};
use crate::pool::worker::{Worker, WorkerStats};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Observer for pool lifecycle events.
///
/// Registered at construction through [`PoolConfig::with_observer`]. All
/// hooks are invoked synchronously with no internal lock held, so an
/// implementation may call back into the pool without deadlocking.
pub trait PoolObserver: Send + Sync {
    /// A new worker thread was created.
    fn on_worker_started(&self, _worker_id: usize) {}

    /// A worker was removed from the pool (idle reclamation or shutdown).
    fn on_worker_stopped(&self, _worker_id: usize) {}

    /// Work items still queued on a worker were dropped unexecuted during
    /// teardown.
    fn on_items_dropped(&self, _worker_id: usize, _count: usize) {}
}

/// Configuration for a worker pool
#[derive(Clone)]
pub struct PoolConfig {
    /// Hard cap on the number of workers in hard-cap mode; growth increment
    /// in soft-cap mode (0 = number of CPUs)
    pub max_workers: usize,
    /// Soft per-worker load cap. 0 means hard-cap mode: the pool grows one
    /// worker at a time up to `max_workers`. Nonzero means soft-cap mode:
    /// the pool grows by a whole generation of `max_workers` workers only
    /// once every existing worker carries at least this many items.
    pub max_pending_per_worker: usize,
    /// Bounded wait when joining a worker during teardown.
    /// Default: 10 seconds
    pub join_timeout: Duration,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// Lifecycle observer (if any)
    observer: Option<Arc<dyn PoolObserver>>,
}

impl std::fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolConfig")
            .field("max_workers", &self.max_workers)
            .field("max_pending_per_worker", &self.max_pending_per_worker)
            .field("join_timeout", &self.join_timeout)
            .field("thread_name_prefix", &self.thread_name_prefix)
            .field("observer", &self.observer.as_ref().map(|_| "<observer>"))
            .finish()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get(),
            max_pending_per_worker: 0,
            join_timeout: Duration::from_secs(10),
            thread_name_prefix: "worker".to_string(),
            observer: None,
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with the specified worker cap
    #[must_use]
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: if max_workers == 0 {
                num_cpus::get()
            } else {
                max_workers
            },
            ..Default::default()
        }
    }

    /// Set the soft per-worker load cap (0 = hard-cap mode)
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_pending_per_worker(mut self, cap: usize) -> Self {
        self.max_pending_per_worker = cap;
        self
    }

    /// Set the bounded wait used when joining workers at teardown.
    ///
    /// # Panics
    ///
    /// Panics if the timeout is zero.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        assert!(!timeout.is_zero(), "join timeout must be non-zero");
        self.join_timeout = timeout;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Register a lifecycle observer
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_observer(mut self, observer: Arc<dyn PoolObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(PoolError::invalid_config(
                "max_workers",
                "Worker cap must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// State shared between the pool handle and its worker threads.
///
/// The worker list is owned and mutated only under its lock. When a worker
/// lock is also needed, the list lock is always taken first.
pub(crate) struct PoolShared {
    config: PoolConfig,
    workers: Mutex<Vec<Worker>>,
    /// Counters folded in from retired workers, so pool-wide totals never
    /// go backwards when the pool shrinks.
    retired: WorkerStats,
    next_id: AtomicUsize,
}

impl PoolShared {
    /// Retire at most one idle worker other than the caller.
    ///
    /// Invoked by a worker thread whose own queue just drained. The pool
    /// never shrinks below one worker and a worker never removes itself,
    /// so the joined thread is always some other, parked worker.
    pub(crate) fn reclaim_idle(self: &Arc<Self>, caller_id: usize) {
        let victim = {
            let mut workers = self.workers.lock();
            if workers.len() <= 1 {
                return;
            }
            match workers
                .iter()
                .position(|w| w.id() != caller_id && w.is_idle())
            {
                Some(idx) => {
                    let victim = workers.remove(idx);
                    victim.stop();
                    victim
                }
                None => return,
            }
        };

        let id = victim.id();
        // The victim is parked with an empty queue: its counters are
        // quiescent, so folding before the join is exact.
        self.retired.merge(&victim.stats());
        if let Err(e) = victim.join_timeout(self.config.join_timeout) {
            log::warn!("idle reclamation: {}; discarding worker", e);
        }
        log::debug!("reclaimed idle worker {}", id);
        if let Some(observer) = &self.config.observer {
            observer.on_worker_stopped(id);
        }
    }

    /// Relay a teardown drop count to the observer, if one is registered.
    pub(crate) fn notify_items_dropped(&self, worker_id: usize, count: usize) {
        if let Some(observer) = &self.config.observer {
            observer.on_items_dropped(worker_id, count);
        }
    }
}

/// A dynamically sized pool of worker threads with load-aware placement.
///
/// Work items are placed on the least-loaded worker, with an idle worker
/// always preferred. The pool grows on demand up to its configured bounds
/// and shrinks again by retiring idle workers, never below one worker.
///
/// # Growth Policy
///
/// - **Hard-cap mode** (`max_pending_per_worker == 0`): grow one worker at
///   a time until `max_workers` exist, then queue on the least loaded.
/// - **Soft-cap mode** (`max_pending_per_worker > 0`): grow by a whole
///   generation of `max_workers` workers, but only once every worker of the
///   current generation carries at least `max_pending_per_worker` items.
///
/// # Teardown
///
/// [`shutdown`](WorkerPool::shutdown) (also run on drop) stops workers one
/// at a time with a bounded join. Items still queued at that point are
/// dropped without running; register a [`PoolObserver`] to be told about
/// them.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.shared.config)
            .field("worker_count", &self.worker_count())
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(PoolConfig::default())
    }

    /// Create a pool with the specified worker cap
    pub fn with_max_workers(max_workers: usize) -> Result<Self> {
        Self::with_config(PoolConfig::new(max_workers))
    }

    /// Create a pool with custom configuration
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(PoolShared {
                config,
                workers: Mutex::new(Vec::new()),
                retired: WorkerStats::new(),
                next_id: AtomicUsize::new(0),
            }),
        })
    }

    /// Submit a work item for execution.
    ///
    /// Never blocks on work execution, only briefly on internal locks.
    /// Placement always succeeds once the pool holds at least one worker;
    /// the only possible failure is a thread-spawn error on an empty pool.
    pub fn submit<W: WorkItem + 'static>(&self, item: W) -> Result<()> {
        self.submit_boxed(Box::new(item))
    }

    /// Submit a closure as a work item
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(ClosureWork::new(f))
    }

    /// Place a boxed item on an existing or newly created worker.
    fn submit_boxed(&self, item: BoxedWorkItem) -> Result<()> {
        let shared = &self.shared;
        let started;
        {
            let mut workers = shared.workers.lock();

            // Track the least-loaded worker; an idle one wins outright.
            let mut min_idx = None;
            let mut min_load = usize::MAX;
            for (idx, worker) in workers.iter().enumerate() {
                if !worker.is_active() {
                    continue;
                }
                let load = worker.load();
                if load == 0 {
                    worker.assign(item);
                    return Ok(());
                }
                if load < min_load {
                    min_load = load;
                    min_idx = Some(idx);
                }
            }

            let count = workers.len();
            let grow = if count == 0 {
                true
            } else if shared.config.max_pending_per_worker > 0 {
                // Finish filling the current generation of `max_workers`
                // workers; once complete, start another only when every
                // worker is saturated.
                count % shared.config.max_workers != 0
                    || min_load >= shared.config.max_pending_per_worker
            } else {
                count < shared.config.max_workers
            };

            if grow {
                let id = shared.next_id.fetch_add(1, Ordering::Relaxed);
                match Worker::spawn(
                    id,
                    &shared.config.thread_name_prefix,
                    Arc::downgrade(shared),
                ) {
                    Ok(worker) => {
                        worker.assign(item);
                        workers.push(worker);
                        started = id;
                    }
                    Err(e) => {
                        return match min_idx {
                            // Degrade to queueing so placement still succeeds
                            Some(idx) => {
                                log::warn!("{}; queueing on least-loaded worker", e);
                                workers[idx].assign(item);
                                Ok(())
                            }
                            None => Err(e),
                        };
                    }
                }
            } else {
                let idx = min_idx.expect("non-empty pool with no placeable worker");
                workers[idx].assign(item);
                return Ok(());
            }
        }

        if let Some(observer) = &shared.config.observer {
            observer.on_worker_started(started);
        }
        Ok(())
    }

    /// Get the current number of workers
    pub fn worker_count(&self) -> usize {
        self.shared.workers.lock().len()
    }

    /// Total queued and executing items across all workers
    pub fn pending_items(&self) -> usize {
        self.shared.workers.lock().iter().map(|w| w.load()).sum()
    }

    /// Get statistics for all workers
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.shared.workers.lock().iter().map(|w| w.stats()).collect()
    }

    /// Get total items processed across all workers, including retired ones
    pub fn total_items_processed(&self) -> u64 {
        let live: u64 = self
            .shared
            .workers
            .lock()
            .iter()
            .map(|w| w.stats().get_items_processed())
            .sum();
        live + self.shared.retired.get_items_processed()
    }

    /// Get total items panicked across all workers, including retired ones
    pub fn total_items_panicked(&self) -> u64 {
        let live: u64 = self
            .shared
            .workers
            .lock()
            .iter()
            .map(|w| w.stats().get_items_panicked())
            .sum();
        live + self.shared.retired.get_items_panicked()
    }

    /// Shut down the pool and join every worker.
    ///
    /// Workers are stopped one at a time: pop from the list under the lock,
    /// signal it, then join outside the lock with the configured bounded
    /// wait. A worker that fails to terminate in time is logged and
    /// discarded; teardown always completes. Items still queued are dropped
    /// unexecuted. Idempotent and safe to call from drop.
    pub fn shutdown(&self) {
        loop {
            let worker = self.shared.workers.lock().pop();
            let Some(worker) = worker else { break };

            let id = worker.id();
            worker.stop();
            let stats = worker.stats();
            if let Err(e) = worker.join_timeout(self.shared.config.join_timeout) {
                log::warn!("shutdown: {}; discarding worker", e);
            }
            // Folded after the join so an item that was mid-execution at
            // the stop signal is still counted.
            self.shared.retired.merge(&stats);
            if let Some(observer) = &self.shared.config.observer {
                observer.on_worker_stopped(id);
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
