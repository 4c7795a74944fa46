//! Bounded worker pool
//!
//! Units are dispatched in scan order. The dispatcher acquires a slot
//! before handing a unit to a worker thread and the worker releases it when
//! done, so at most `concurrency` units are in flight. Results flow back
//! through a single completion queue drained by the caller's thread in
//! arrival order.
//!
//! The first failure stops dispatch and is returned to the caller right
//! away; units already running are left to finish on their own.

use parking_lot::{Condvar, Mutex};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use tracing::debug;

use crate::errors::{BuildError, PoolError, WorkerFailure};
use crate::scanner::PluginSourceUnit;
use crate::worker_id::{worker_id, WORKER_IDS};

/// Lower bound on concurrent builds regardless of host size
pub const MIN_CONCURRENT: usize = 2;

/// `max(cpus - 2, 2)`
pub fn max_parallelism(cpus: usize) -> usize {
    cpus.saturating_sub(2).max(MIN_CONCURRENT)
}

/// Concurrency bound for the current host
pub fn host_parallelism() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);
    max_parallelism(cpus)
}

/// Scheduling parameters, fixed for the lifetime of a run
#[derive(Debug, Clone)]
pub struct PoolConfig {
    concurrency: usize,
    worker_ids: &'static [&'static str],
    id_offset: usize,
}

impl PoolConfig {
    pub fn new(concurrency: usize, id_offset: usize) -> Self {
        PoolConfig {
            concurrency: concurrency.max(1),
            worker_ids: WORKER_IDS,
            id_offset,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_worker_ids(mut self, ids: &'static [&'static str]) -> Self {
        if !ids.is_empty() {
            self.worker_ids = ids;
        }
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn worker_id(&self, index: usize) -> &'static str {
        worker_id(self.worker_ids, index, self.id_offset)
    }
}

// =============================================================================
// SLOTS
// =============================================================================

/// Counting semaphore guarding the number of units in flight
#[derive(Debug)]
pub struct Slots {
    available: Mutex<usize>,
    released: Condvar,
    capacity: usize,
}

impl Slots {
    pub fn new(capacity: usize) -> Self {
        Slots {
            available: Mutex::new(capacity),
            released: Condvar::new(),
            capacity,
        }
    }

    /// Block until a slot is free and take it
    pub fn acquire(self: &Arc<Self>) -> SlotGuard {
        let mut available = self.available.lock();
        while *available == 0 {
            self.released.wait(&mut available);
        }
        *available -= 1;
        SlotGuard {
            slots: Arc::clone(self),
        }
    }

    pub fn in_use(&self) -> usize {
        self.capacity - *self.available.lock()
    }

    fn release(&self) {
        let mut available = self.available.lock();
        *available += 1;
        self.released.notify_one();
    }
}

/// A held slot; dropping it frees the slot
#[derive(Debug)]
pub struct SlotGuard {
    slots: Arc<Slots>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.slots.release();
    }
}

// =============================================================================
// POOL
// =============================================================================

pub struct WorkerPool {
    config: PoolConfig,
    threads: Arc<ThreadPool>,
}

impl WorkerPool {
    pub fn new(config: &PoolConfig) -> Result<Self, PoolError> {
        let threads = ThreadPoolBuilder::new()
            .num_threads(config.concurrency())
            .thread_name(|i| format!("plugforge-worker-{}", i))
            // A panicking unit never reports; the collector sees it as Incomplete
            .panic_handler(|_| tracing::error!("plugin worker panicked"))
            .build()
            .map_err(|e| PoolError::Start(e.to_string()))?;

        Ok(WorkerPool {
            config: config.clone(),
            threads: Arc::new(threads),
        })
    }

    /// Run `work` once per unit and collect the results in completion order.
    pub fn run<T, F>(&self, units: Vec<PluginSourceUnit>, work: F) -> Result<Vec<T>, PoolError>
    where
        T: Send + 'static,
        F: Fn(&PluginSourceUnit, &'static str) -> Result<T, BuildError> + Send + Sync + 'static,
    {
        let expected = units.len();
        if expected == 0 {
            return Ok(Vec::new());
        }

        let slots = Arc::new(Slots::new(self.config.concurrency()));
        let aborted = Arc::new(AtomicBool::new(false));
        let work = Arc::new(work);
        let (tx, rx) = mpsc::channel::<Result<T, WorkerFailure>>();

        let config = self.config.clone();
        let threads = Arc::clone(&self.threads);
        let dispatch_aborted = Arc::clone(&aborted);

        std::thread::Builder::new()
            .name("plugforge-dispatch".to_string())
            .spawn(move || {
                for unit in units {
                    if dispatch_aborted.load(Ordering::SeqCst) {
                        break;
                    }
                    let slot = slots.acquire();
                    if dispatch_aborted.load(Ordering::SeqCst) {
                        break;
                    }

                    let id = config.worker_id(unit.index);
                    tracing::trace!(
                        "Dispatching {:?} as {} ({}/{} slots in use)",
                        unit.path,
                        id,
                        slots.in_use(),
                        slots.capacity
                    );
                    let tx = tx.clone();
                    let work = Arc::clone(&work);
                    let job_aborted = Arc::clone(&dispatch_aborted);

                    threads.spawn(move || {
                        let _slot = slot;
                        if job_aborted.load(Ordering::SeqCst) {
                            return;
                        }
                        let result = work(&unit, id).map_err(|error| WorkerFailure {
                            id,
                            source_dir: unit.path.clone(),
                            error,
                        });
                        // The collector may already have returned on another failure
                        let _ = tx.send(result);
                    });
                }
            })
            .map_err(|e| PoolError::Start(e.to_string()))?;

        let mut results = Vec::with_capacity(expected);
        while let Ok(received) = rx.recv() {
            match received {
                Ok(summary) => {
                    results.push(summary);
                    debug!("Completed {}/{} plugins", results.len(), expected);
                }
                Err(failure) => {
                    aborted.store(true, Ordering::SeqCst);
                    return Err(PoolError::Worker(failure));
                }
            }
        }

        if results.len() != expected {
            return Err(PoolError::Incomplete {
                expected,
                received: results.len(),
            });
        }
        Ok(results)
    }
}
