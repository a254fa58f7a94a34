use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::LumaError;

/// Settings for the work-stealing pool shared by the range, tile and hybrid
/// strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Number of worker threads. `0` lets rayon pick (one per logical CPU,
    /// or `RAYON_NUM_THREADS` if set).
    pub num_threads: usize,
    /// Prefix for worker thread names; the worker index is appended.
    pub thread_name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            thread_name: "luma-worker".to_owned(),
        }
    }
}

/// Handle to a work-stealing thread pool.
///
/// The pool is built once by the driver and handed to every parallel
/// strategy, rather than living in hidden global state. Cloning the handle
/// shares the same pool.
#[derive(Clone)]
pub struct Scheduler {
    pool: Arc<ThreadPool>,
}

impl Scheduler {
    /// # Errors
    /// - If the operating system refuses to spawn the worker threads
    pub fn new(config: &SchedulerConfig) -> Result<Self, LumaError> {
        let prefix = config.thread_name.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(move |index| format!("{prefix}-{index}"))
            .build()?;
        log::debug!(
            "Built scheduler with {} worker threads",
            pool.current_num_threads()
        );

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Number of worker threads in the pool.
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `op` inside the pool, so that any rayon work it spawns is
    /// scheduled on this pool's workers. Blocks until `op` returns.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("num_threads", &self.num_threads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_thread_count() {
        let scheduler = Scheduler::new(&SchedulerConfig {
            num_threads: 3,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(scheduler.num_threads(), 3);
        assert_eq!(scheduler.clone().num_threads(), 3);
    }

    #[test]
    fn install_runs_on_named_workers() {
        let scheduler = Scheduler::new(&SchedulerConfig {
            num_threads: 2,
            thread_name: "probe".to_owned(),
        })
        .unwrap();
        let name = scheduler.install(|| std::thread::current().name().map(str::to_owned));
        assert!(name.unwrap().starts_with("probe-"));
    }
}
