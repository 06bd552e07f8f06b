//! Execution settings shared by every solver strategy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::convergence::StoppingCriterion;
use crate::error::{JacobiError, Result};
use crate::system::LinearSystem;

/// Iteration limit, tolerance and worker count for one solve.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum number of Jacobi iterations `K`. Zero means "use the system size".
    pub max_iterations: usize,
    /// Relative-change tolerance. Any negative value disables the convergence check.
    pub tolerance: f64,
    /// Worker threads for the parallel strategies (ignored by the sequential solver).
    pub workers: usize,
    /// Optional cancellation flag, sampled once per iteration boundary.
    #[serde(skip)]
    pub abort: Option<AbortHandle>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 0,
            tolerance: -1.0,
            workers: 1,
            abort: None,
        }
    }
}

impl ExecutionConfig {
    /// Creates a configuration for one worker with the given limit and tolerance.
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            ..Self::default()
        }
    }

    /// Set the number of worker threads used by the parallel strategies.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Attach a cancellation flag that can stop the run between iterations.
    pub fn with_abort(mut self, abort: AbortHandle) -> Self {
        self.abort = Some(abort);
        self
    }

    /// Iteration limit for a system of size `n`; a zero limit is replaced by `n`.
    pub fn iteration_limit(&self, n: usize) -> usize {
        if self.max_iterations == 0 {
            log::warn!("maximum iteration count not positive; using system size {n}");
            n
        } else {
            self.max_iterations
        }
    }

    /// Stopping rule derived from the configured tolerance.
    pub fn criterion(&self) -> StoppingCriterion {
        StoppingCriterion::new(self.tolerance)
    }

    pub(crate) fn abort_requested(&self) -> bool {
        self.abort.as_ref().is_some_and(AbortHandle::is_aborted)
    }

    /// Validates the worker count against the system size for a partitioned strategy.
    pub fn validate_workers(&self, system: &LinearSystem) -> Result<usize> {
        let n = system.size();
        if self.workers == 0 {
            return Err(JacobiError::invalid_input(
                "worker count must be at least 1",
            ));
        }
        if self.workers > n {
            return Err(JacobiError::invalid_input(format!(
                "worker count {} exceeds the {n} rows available for partitioning",
                self.workers
            )));
        }
        Ok(self.workers)
    }
}

/// Cloneable cancellation flag shared between a caller and a running solve.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    /// Creates a handle that has not been triggered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the solve stop at the next iteration boundary.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether [`abort`](Self::abort) has been called on this handle or any clone.
    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(n: usize) -> LinearSystem {
        let mut coefficients = vec![0.0; n * n];
        for i in 0..n {
            coefficients[i * n + i] = 1.0;
        }
        LinearSystem::from_row_slice(n, &coefficients, &vec![1.0; n]).unwrap()
    }

    #[test]
    fn zero_iterations_fall_back_to_size() {
        assert_eq!(ExecutionConfig::new(0, 1e-6).iteration_limit(7), 7);
        assert_eq!(ExecutionConfig::new(3, 1e-6).iteration_limit(7), 3);
    }

    #[test]
    fn worker_count_is_bounded_by_rows() {
        let sys = system(4);
        assert_eq!(
            ExecutionConfig::default()
                .with_workers(4)
                .validate_workers(&sys)
                .unwrap(),
            4
        );
        assert!(ExecutionConfig::default()
            .with_workers(0)
            .validate_workers(&sys)
            .is_err());
        assert!(ExecutionConfig::default()
            .with_workers(5)
            .validate_workers(&sys)
            .is_err());
    }

    #[test]
    fn abort_handle_is_shared_between_clones() {
        let handle = AbortHandle::new();
        let config = ExecutionConfig::new(10, -1.0).with_abort(handle.clone());
        assert!(!config.abort_requested());
        handle.abort();
        assert!(config.abort_requested());
    }
}
