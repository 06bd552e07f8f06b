//! Fork-join Jacobi: one parallel loop per iteration on a dedicated rayon pool.

use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::Result;
use crate::options::ExecutionConfig;
use crate::partition::chunk_len;
use crate::solving::{plan, JacobiSolver, RoundLedger, SolveReport, Strategy};
use crate::system::LinearSystem;

/// Parallel-for strategy: the pool decides which thread runs which chunk each iteration.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParallelForSolver;

impl JacobiSolver for ParallelForSolver {
    fn strategy(&self) -> Strategy {
        Strategy::ParallelFor
    }

    fn solve(&self, system: &LinearSystem, config: &ExecutionConfig) -> Result<SolveReport> {
        let run = plan(system, config)?;
        let workers = config.validate_workers(system)?;
        let n = system.size();
        let chunk = chunk_len(n, workers);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("jacobi-pf-{index}"))
            .build()?;
        log::debug!("parallel-for over {n} rows: {workers} workers, chunk {chunk}");

        let mut current = vec![0.0; n];
        let mut previous = vec![0.0; n];
        let mut ledger = RoundLedger::new();

        let start = Instant::now();
        while ledger.iterations < run.limit {
            if config.abort_requested() {
                ledger.abort(Strategy::ParallelFor);
                break;
            }

            // Chunks are disjoint, so every row is written by exactly one task; `install`
            // returns only after all of them have finished.
            let source = &previous;
            pool.install(|| {
                current
                    .par_chunks_mut(chunk)
                    .enumerate()
                    .for_each(|(index, rows)| {
                        let first = index * chunk;
                        for (offset, value) in rows.iter_mut().enumerate() {
                            *value = system.jacobi_row(first + offset, source);
                        }
                    });
            });
            ledger.iterations += 1;

            if run.criterion.is_enabled() {
                let verdict = run.criterion.check(&current, &previous);
                if ledger.record(Strategy::ParallelFor, &run.criterion, verdict) {
                    break;
                }
            }
            previous.copy_from_slice(&current);
        }
        let elapsed = start.elapsed();

        Ok(ledger.into_report(Strategy::ParallelFor, workers, current, elapsed))
    }
}
