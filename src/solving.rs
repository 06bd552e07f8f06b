//! Strategy selection, the common solver interface and run diagnostics.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::convergence::{ConvergenceResult, StoppingCriterion};
use crate::error::{JacobiError, Result};
use crate::options::ExecutionConfig;
use crate::parallel_for::ParallelForSolver;
use crate::sequential::SequentialSolver;
use crate::system::LinearSystem;
use crate::threaded::BarrierSolver;

/// Execution strategy for the Jacobi kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Single-threaded reference implementation.
    Sequential,
    /// Persistent worker threads over static row blocks, synchronized by a barrier.
    Barrier,
    /// Fork-join parallel loop on a worker pool, one region per iteration.
    ParallelFor,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Sequential, Strategy::Barrier, Strategy::ParallelFor];

    /// Short tag used on the command line and in result file names.
    pub fn tag(self) -> &'static str {
        match self {
            Strategy::Sequential => "seq",
            Strategy::Barrier => "thr",
            Strategy::ParallelFor => "pf",
        }
    }

    /// Whether the strategy honours [`ExecutionConfig::workers`].
    pub fn is_parallel(self) -> bool {
        !matches!(self, Strategy::Sequential)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Strategy {
    type Err = JacobiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "seq" | "sequential" => Ok(Strategy::Sequential),
            "thr" | "barrier" => Ok(Strategy::Barrier),
            "pf" | "ff" | "parallel-for" => Ok(Strategy::ParallelFor),
            other => Err(JacobiError::invalid_input(format!(
                "unknown strategy `{other}`; expected one of seq, thr, pf"
            ))),
        }
    }
}

/// Terminal state of a solve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// The relative change dropped to or below the tolerance.
    Converged,
    /// All `K` iterations ran without meeting the tolerance (or with the check disabled).
    MaxIterationsReached,
    /// The caller's [`AbortHandle`](crate::options::AbortHandle) fired at an iteration boundary.
    Aborted,
}

/// Solution and diagnostics returned by every strategy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolveReport {
    /// Final "current" iterate.
    pub solution: DVector<f64>,
    /// Number of full iterations executed.
    pub iterations: usize,
    /// Whether the tolerance was met before the iteration limit.
    pub converged: bool,
    /// Relative change of the last evaluated iteration, if the check ran and was defined.
    pub epsilon: Option<f64>,
    /// Wall-clock time spent iterating.
    pub elapsed: Duration,
    pub termination: Termination,
    pub strategy: Strategy,
    /// Worker count actually used (1 for the sequential strategy).
    pub workers: usize,
}

/// Common entry point implemented by each strategy.
pub trait JacobiSolver {
    fn strategy(&self) -> Strategy;

    /// Runs Jacobi iteration on `system` from a zero initial guess.
    fn solve(&self, system: &LinearSystem, config: &ExecutionConfig) -> Result<SolveReport>;
}

/// Runs `system` through the solver for `strategy`.
pub fn solve(
    strategy: Strategy,
    system: &LinearSystem,
    config: &ExecutionConfig,
) -> Result<SolveReport> {
    match strategy {
        Strategy::Sequential => SequentialSolver.solve(system, config),
        Strategy::Barrier => BarrierSolver.solve(system, config),
        Strategy::ParallelFor => ParallelForSolver.solve(system, config),
    }
}

/// Validated parameters common to every strategy.
pub(crate) struct RunPlan {
    pub limit: usize,
    pub criterion: StoppingCriterion,
}

/// Input checks performed before any iteration: diagonal entries and iteration limit.
pub(crate) fn plan(system: &LinearSystem, config: &ExecutionConfig) -> Result<RunPlan> {
    system.validate_diagonal()?;
    if !system.is_diagonally_dominant() {
        log::warn!("coefficient matrix is not diagonally dominant; Jacobi iteration may diverge");
    }
    Ok(RunPlan {
        limit: config.iteration_limit(system.size()),
        criterion: config.criterion(),
    })
}

/// Per-run bookkeeping, updated once per completed iteration by a single writer.
#[derive(Debug)]
pub(crate) struct RoundLedger {
    pub iterations: usize,
    pub epsilon: Option<f64>,
    pub termination: Termination,
}

impl RoundLedger {
    pub fn new() -> Self {
        Self {
            iterations: 0,
            epsilon: None,
            termination: Termination::MaxIterationsReached,
        }
    }

    /// Records the convergence check of the iteration just completed.
    /// Returns `true` when the run should stop.
    pub fn record(
        &mut self,
        strategy: Strategy,
        criterion: &StoppingCriterion,
        verdict: ConvergenceResult,
    ) -> bool {
        self.epsilon = verdict.epsilon;
        if let Some(epsilon) = verdict.epsilon {
            log::trace!("{strategy}: iteration {} epsilon {epsilon:e}", self.iterations);
        }
        if !verdict.converged {
            return false;
        }
        log::info!(
            "{strategy}: stopped after iteration {} because epsilon {:e} <= tolerance {:e}",
            self.iterations.saturating_sub(1),
            verdict.epsilon.unwrap_or_default(),
            criterion.tolerance()
        );
        self.termination = Termination::Converged;
        true
    }

    pub fn abort(&mut self, strategy: Strategy) {
        log::info!("{strategy}: aborted after {} iterations", self.iterations);
        self.termination = Termination::Aborted;
    }

    pub fn into_report(
        self,
        strategy: Strategy,
        workers: usize,
        solution: Vec<f64>,
        elapsed: Duration,
    ) -> SolveReport {
        log::debug!(
            "{strategy} with {workers} workers: {} iterations in {elapsed:?} ({:?})",
            self.iterations,
            self.termination
        );
        SolveReport {
            solution: DVector::from_vec(solution),
            iterations: self.iterations,
            converged: self.termination == Termination::Converged,
            epsilon: self.epsilon,
            elapsed,
            termination: self.termination,
            strategy,
            workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_tags_round_trip_through_from_str() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.tag().parse::<Strategy>().unwrap(), strategy);
        }
        assert_eq!("ff".parse::<Strategy>().unwrap(), Strategy::ParallelFor);
        assert!("gpu".parse::<Strategy>().is_err());
    }

    #[test]
    fn only_sequential_ignores_workers() {
        assert!(!Strategy::Sequential.is_parallel());
        assert!(Strategy::Barrier.is_parallel());
        assert!(Strategy::ParallelFor.is_parallel());
    }
}
