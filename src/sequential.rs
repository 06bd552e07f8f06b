//! Single-threaded reference implementation of Jacobi iteration.

use std::time::Instant;

use crate::error::Result;
use crate::options::ExecutionConfig;
use crate::solving::{plan, JacobiSolver, RoundLedger, SolveReport, Strategy};
use crate::system::LinearSystem;

/// Baseline strategy: one thread, one call stack, no synchronization.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialSolver;

impl JacobiSolver for SequentialSolver {
    fn strategy(&self) -> Strategy {
        Strategy::Sequential
    }

    fn solve(&self, system: &LinearSystem, config: &ExecutionConfig) -> Result<SolveReport> {
        let run = plan(system, config)?;
        let n = system.size();
        let mut current = vec![0.0; n];
        let mut previous = vec![0.0; n];
        let mut ledger = RoundLedger::new();

        let start = Instant::now();
        while ledger.iterations < run.limit {
            if config.abort_requested() {
                ledger.abort(Strategy::Sequential);
                break;
            }

            for (i, value) in current.iter_mut().enumerate() {
                *value = system.jacobi_row(i, &previous);
            }
            ledger.iterations += 1;

            if run.criterion.is_enabled() {
                let verdict = run.criterion.check(&current, &previous);
                if ledger.record(Strategy::Sequential, &run.criterion, verdict) {
                    break;
                }
            }
            previous.copy_from_slice(&current);
        }
        let elapsed = start.elapsed();

        Ok(ledger.into_report(Strategy::Sequential, 1, current, elapsed))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::JacobiError;
    use crate::options::AbortHandle;
    use crate::solving::Termination;

    fn two_by_two() -> LinearSystem {
        LinearSystem::from_row_slice(2, &[4.0, 1.0, 1.0, 3.0], &[6.0, 5.0]).unwrap()
    }

    #[test]
    fn trivial_fixed_point() {
        let system = LinearSystem::from_row_slice(1, &[2.0], &[4.0]).unwrap();
        let report = SequentialSolver
            .solve(&system, &ExecutionConfig::new(5, -1.0))
            .unwrap();
        assert_eq!(report.iterations, 5);
        assert!(!report.converged);
        assert_eq!(report.epsilon, None);
        assert_eq!(report.termination, Termination::MaxIterationsReached);
        assert_relative_eq!(report.solution[0], 2.0);
    }

    #[test]
    fn converges_to_exact_solution() {
        let report = SequentialSolver
            .solve(&two_by_two(), &ExecutionConfig::new(50, 1e-6))
            .unwrap();
        assert!(report.converged);
        assert!(report.iterations < 50);
        assert!(report.epsilon.unwrap() <= 1e-6);
        assert_relative_eq!(report.solution[0], 13.0 / 11.0, epsilon = 1e-5);
        assert_relative_eq!(report.solution[1], 14.0 / 11.0, epsilon = 1e-5);
    }

    #[test]
    fn zero_max_iterations_uses_system_size() {
        let report = SequentialSolver
            .solve(&two_by_two(), &ExecutionConfig::new(0, -1.0))
            .unwrap();
        assert_eq!(report.iterations, 2);
    }

    #[test]
    fn zero_rhs_never_converges() {
        let system = LinearSystem::from_row_slice(2, &[4.0, 1.0, 1.0, 3.0], &[0.0, 0.0]).unwrap();
        let report = SequentialSolver
            .solve(&system, &ExecutionConfig::new(4, 1.0))
            .unwrap();
        assert_eq!(report.iterations, 4);
        assert!(!report.converged);
        assert_eq!(report.epsilon, None);
    }

    #[test]
    fn zero_diagonal_fails_before_iterating() {
        let system = LinearSystem::from_row_slice(2, &[0.0, 1.0, 1.0, 3.0], &[1.0, 1.0]).unwrap();
        let result = SequentialSolver.solve(&system, &ExecutionConfig::new(10, -1.0));
        assert!(matches!(result, Err(JacobiError::ZeroDiagonal { row: 0, .. })));
    }

    #[test]
    fn abort_before_start_runs_no_iterations() {
        let abort = AbortHandle::new();
        abort.abort();
        let config = ExecutionConfig::new(10, -1.0).with_abort(abort);
        let report = SequentialSolver.solve(&two_by_two(), &config).unwrap();
        assert_eq!(report.iterations, 0);
        assert_eq!(report.termination, Termination::Aborted);
        assert_eq!(report.solution.as_slice(), &[0.0, 0.0]);
    }
}
