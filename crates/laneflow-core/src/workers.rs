//! Worker-count policy and the thread pools that back it.
//!
//! The number of workers for a tick scales with the live population. Pools
//! are built lazily, one per distinct worker count, and reused on later
//! ticks. Changing the count between ticks only affects throughput.

use std::collections::BTreeMap;

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::SimError;

/// How many workers a tick gets for a given live population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerPolicy {
    /// One worker plus one more per `vehicles_per_worker` live vehicles,
    /// capped at `max_workers`.
    Scaled {
        vehicles_per_worker: usize,
        max_workers: usize,
    },
    /// Always run on exactly this many workers.
    Fixed(usize),
}

impl WorkerPolicy {
    /// Scaled policy with the default ratio and an explicit cap.
    pub fn capped(max_workers: usize) -> Self {
        WorkerPolicy::Scaled {
            vehicles_per_worker: 32,
            max_workers,
        }
    }

    pub fn workers_for(&self, live: usize) -> usize {
        match *self {
            WorkerPolicy::Scaled {
                vehicles_per_worker,
                max_workers,
            } => {
                let wanted = live / vehicles_per_worker.max(1) + 1;
                wanted.clamp(1, max_workers.max(1))
            }
            WorkerPolicy::Fixed(workers) => workers.max(1),
        }
    }
}

impl Default for WorkerPolicy {
    fn default() -> Self {
        Self::capped(std::thread::available_parallelism().map_or(4, |n| n.get()))
    }
}

/// Cache of thread pools keyed by worker count.
#[derive(Debug, Default)]
pub struct WorkerPools {
    pools: BTreeMap<usize, ThreadPool>,
}

impl WorkerPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool with exactly `workers` threads, building it on first use.
    pub fn get(&mut self, workers: usize) -> Result<&ThreadPool, SimError> {
        let workers = workers.max(1);
        if !self.pools.contains_key(&workers) {
            trace!(workers, "building worker pool");
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("laneflow-worker-{i}"))
                .build()
                .map_err(|source| SimError::WorkerPool { workers, source })?;
            self.pools.insert(workers, pool);
        }
        Ok(&self.pools[&workers])
    }

    /// Number of distinct pools built so far.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workers_scale_with_population() {
        let policy = WorkerPolicy::capped(64);
        assert_eq!(policy.workers_for(0), 1);
        assert_eq!(policy.workers_for(31), 1);
        assert_eq!(policy.workers_for(32), 2);
        assert_eq!(policy.workers_for(60), 2);
        assert_eq!(policy.workers_for(320), 11);
    }

    #[test]
    fn workers_are_capped() {
        let policy = WorkerPolicy::capped(4);
        assert_eq!(policy.workers_for(10_000), 4);
    }

    #[test]
    fn fixed_policy_ignores_population() {
        let policy = WorkerPolicy::Fixed(3);
        assert_eq!(policy.workers_for(0), 3);
        assert_eq!(policy.workers_for(1_000_000), 3);
    }

    #[test]
    fn pools_are_cached_per_size() {
        let mut pools = WorkerPools::new();
        assert_eq!(pools.get(2).unwrap().current_num_threads(), 2);
        assert_eq!(pools.get(2).unwrap().current_num_threads(), 2);
        assert_eq!(pools.get(3).unwrap().current_num_threads(), 3);
        assert_eq!(pools.len(), 2);
    }
}
