//! Native-thread Jacobi with static row blocks and one barrier per iteration.
//!
//! Each worker owns one contiguous block of rows for the whole solve and only
//! ever writes its own block of the current iterate. The barrier's leader
//! action is the single writer of everything else: it gathers the blocks,
//! evaluates convergence, swaps the gathered iterate into `previous` and
//! publishes the number of rounds left. Workers read that counter at the top of
//! each round, after the barrier has released them, so every worker sees the
//! same value and no round is computed after the run has been decided.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use std::thread;
use std::time::Instant;

use crate::barrier::RoundBarrier;
use crate::convergence::StoppingCriterion;
use crate::error::{JacobiError, Result};
use crate::options::ExecutionConfig;
use crate::partition::partition_rows;
use crate::solving::{plan, JacobiSolver, RoundLedger, SolveReport, Strategy};
use crate::system::LinearSystem;

/// Fixed pool of scoped worker threads synchronized by a [`RoundBarrier`].
#[derive(Clone, Copy, Debug, Default)]
pub struct BarrierSolver;

impl JacobiSolver for BarrierSolver {
    fn strategy(&self) -> Strategy {
        Strategy::Barrier
    }

    fn solve(&self, system: &LinearSystem, config: &ExecutionConfig) -> Result<SolveReport> {
        let run = plan(system, config)?;
        let workers = config.validate_workers(system)?;
        let ranges = partition_rows(system.size(), workers)?;
        log::debug!("barrier partition over {workers} workers: {ranges:?}");

        let state = RunState::new(system, config, run.criterion, ranges, run.limit);
        let barrier = RoundBarrier::new(workers, || state.complete_round());

        let start = Instant::now();
        let joined = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let state = &state;
                    let barrier = &barrier;
                    scope.spawn(move || state.work(worker, barrier))
                })
                .collect();

            handles
                .into_iter()
                .enumerate()
                .try_for_each(|(worker, handle)| {
                    handle
                        .join()
                        .map_err(|_| JacobiError::WorkerPanicked { worker })
                })
        });
        let elapsed = start.elapsed();
        joined?;

        drop(barrier);
        let (solution, ledger) = state.finish();
        Ok(ledger.into_report(Strategy::Barrier, workers, solution, elapsed))
    }
}

/// Leader-owned bookkeeping plus the buffer the blocks are gathered into.
struct LeaderState {
    ledger: RoundLedger,
    gathered: Vec<f64>,
}

/// Everything a single barrier solve shares between its workers.
struct RunState<'a> {
    system: &'a LinearSystem,
    config: &'a ExecutionConfig,
    criterion: StoppingCriterion,
    ranges: Vec<Range<usize>>,
    /// The current iterate, one block per worker.
    blocks: Vec<Mutex<Vec<f64>>>,
    previous: RwLock<Vec<f64>>,
    /// Rounds left to run; zero tells workers to exit.
    remaining: AtomicUsize,
    leader: Mutex<LeaderState>,
}

impl<'a> RunState<'a> {
    fn new(
        system: &'a LinearSystem,
        config: &'a ExecutionConfig,
        criterion: StoppingCriterion,
        ranges: Vec<Range<usize>>,
        limit: usize,
    ) -> Self {
        let n = system.size();
        let blocks = ranges
            .iter()
            .map(|range| Mutex::new(vec![0.0; range.len()]))
            .collect();

        let mut ledger = RoundLedger::new();
        let remaining = if config.abort_requested() {
            ledger.abort(Strategy::Barrier);
            0
        } else {
            limit
        };

        Self {
            system,
            config,
            criterion,
            ranges,
            blocks,
            previous: RwLock::new(vec![0.0; n]),
            remaining: AtomicUsize::new(remaining),
            leader: Mutex::new(LeaderState {
                ledger,
                gathered: vec![0.0; n],
            }),
        }
    }

    /// Worker loop: compute this worker's rows, then rendezvous, until no rounds remain.
    fn work<F: FnMut()>(&self, worker: usize, barrier: &RoundBarrier<F>) {
        let range = self.ranges[worker].clone();
        while self.remaining.load(Ordering::Acquire) > 0 {
            {
                let previous = self.previous.read().unwrap_or_else(PoisonError::into_inner);
                let mut block = lock(&self.blocks[worker]);
                for (value, i) in block.iter_mut().zip(range.clone()) {
                    *value = self.system.jacobi_row(i, &previous);
                }
            }
            barrier.wait();
        }
    }

    /// Barrier leader action; runs once per round while every worker is parked.
    fn complete_round(&self) {
        let mut leader = lock(&self.leader);
        let LeaderState { ledger, gathered } = &mut *leader;

        ledger.iterations += 1;
        let mut remaining = self.remaining.load(Ordering::Acquire).saturating_sub(1);

        for (block, range) in self.blocks.iter().zip(&self.ranges) {
            gathered[range.clone()].copy_from_slice(&lock(block));
        }

        let mut previous = self.previous.write().unwrap_or_else(PoisonError::into_inner);
        if self.criterion.is_enabled() {
            let verdict = self.criterion.check(gathered, &previous);
            if ledger.record(Strategy::Barrier, &self.criterion, verdict) {
                remaining = 0;
            }
        }
        // The stale iterate left in `gathered` is overwritten next round.
        std::mem::swap(&mut *previous, gathered);

        if remaining > 0 && self.config.abort_requested() {
            ledger.abort(Strategy::Barrier);
            remaining = 0;
        }
        self.remaining.store(remaining, Ordering::Release);
    }

    fn finish(self) -> (Vec<f64>, RoundLedger) {
        let solution = self
            .blocks
            .into_iter()
            .flat_map(|block| block.into_inner().unwrap_or_else(PoisonError::into_inner))
            .collect();
        let leader = self
            .leader
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        (solution, leader.ledger)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::options::AbortHandle;
    use crate::sequential::SequentialSolver;
    use crate::solving::Termination;

    fn two_by_two() -> LinearSystem {
        LinearSystem::from_row_slice(2, &[4.0, 1.0, 1.0, 3.0], &[6.0, 5.0]).unwrap()
    }

    #[test]
    fn single_row_fixed_point() {
        let system = LinearSystem::from_row_slice(1, &[2.0], &[4.0]).unwrap();
        let config = ExecutionConfig::new(5, -1.0).with_workers(1);
        let report = BarrierSolver.solve(&system, &config).unwrap();
        assert_eq!(report.iterations, 5);
        assert_relative_eq!(report.solution[0], 2.0);
    }

    #[test]
    fn thread_count_does_not_change_the_run() {
        let system = two_by_two();
        let one = BarrierSolver
            .solve(&system, &ExecutionConfig::new(50, 1e-6).with_workers(1))
            .unwrap();
        let two = BarrierSolver
            .solve(&system, &ExecutionConfig::new(50, 1e-6).with_workers(2))
            .unwrap();

        assert!(one.converged);
        assert_eq!(one.iterations, two.iterations);
        assert_eq!(one.epsilon, two.epsilon);
        assert_relative_eq!(one.solution, two.solution, epsilon = 1e-12);
        assert_relative_eq!(two.solution[0], 13.0 / 11.0, epsilon = 1e-5);
    }

    #[test]
    fn matches_sequential_iteration_for_iteration() {
        let n = 9;
        let mut coefficients = vec![1.0; n * n];
        for i in 0..n {
            coefficients[i * n + i] = 2.0 * n as f64;
        }
        let rhs: Vec<f64> = (0..n).map(|i| i as f64 + 1.0).collect();
        let system = LinearSystem::from_row_slice(n, &coefficients, &rhs).unwrap();

        let reference = SequentialSolver
            .solve(&system, &ExecutionConfig::new(7, -1.0))
            .unwrap();
        for workers in [1, 2, 4, 9] {
            let report = BarrierSolver
                .solve(&system, &ExecutionConfig::new(7, -1.0).with_workers(workers))
                .unwrap();
            assert_eq!(report.iterations, 7);
            assert_eq!(report.workers, workers);
            assert_relative_eq!(report.solution, reference.solution, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_more_workers_than_rows() {
        let config = ExecutionConfig::new(5, -1.0).with_workers(3);
        assert!(matches!(
            BarrierSolver.solve(&two_by_two(), &config),
            Err(JacobiError::InvalidInput { .. })
        ));
    }

    #[test]
    fn zero_diagonal_fails_before_spawning() {
        let system = LinearSystem::from_row_slice(2, &[4.0, 1.0, 1.0, 0.0], &[1.0, 1.0]).unwrap();
        let config = ExecutionConfig::new(5, -1.0).with_workers(2);
        assert!(matches!(
            BarrierSolver.solve(&system, &config),
            Err(JacobiError::ZeroDiagonal { row: 1, .. })
        ));
    }

    #[test]
    fn pre_aborted_run_spawns_workers_that_exit_immediately() {
        let abort = AbortHandle::new();
        abort.abort();
        let config = ExecutionConfig::new(10, -1.0)
            .with_workers(2)
            .with_abort(abort);
        let report = BarrierSolver.solve(&two_by_two(), &config).unwrap();
        assert_eq!(report.iterations, 0);
        assert_eq!(report.termination, Termination::Aborted);
    }
}
