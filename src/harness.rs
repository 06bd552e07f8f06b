//! Benchmark driver: repeated trials, speedup/scalability ratios and barrier overhead.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::barrier::RoundBarrier;
use crate::error::{JacobiError, Result};
use crate::options::ExecutionConfig;
use crate::solving::{solve, SolveReport, Strategy};
use crate::system::LinearSystem;

/// Timings collected over several identical runs of one strategy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrialSummary {
    pub strategy: Strategy,
    pub workers: usize,
    /// Elapsed time of each trial, in run order.
    pub durations: Vec<Duration>,
    pub average: Duration,
    /// Report of the final trial; every trial computes the same iterate.
    pub last: SolveReport,
}

/// Solves `system` `trials` times with `strategy` and averages the elapsed time.
pub fn run_trials(
    strategy: Strategy,
    system: &LinearSystem,
    config: &ExecutionConfig,
    trials: usize,
) -> Result<TrialSummary> {
    if trials == 0 {
        return Err(JacobiError::invalid_input("at least one trial is required"));
    }

    let mut durations = Vec::with_capacity(trials);
    let mut last = None;
    for trial in 0..trials {
        let report = solve(strategy, system, config)?;
        log::debug!("{strategy} trial {trial}: {:?}", report.elapsed);
        durations.push(report.elapsed);
        last = Some(report);
    }
    let last = last.ok_or_else(|| JacobiError::invalid_input("at least one trial is required"))?;

    let average = average(&durations);
    log::info!(
        "{strategy} average over {trials} trials: {average:?} ({} iterations)",
        last.iterations
    );
    Ok(TrialSummary {
        strategy,
        workers: last.workers,
        durations,
        average,
        last,
    })
}

fn average(durations: &[Duration]) -> Duration {
    if durations.is_empty() {
        return Duration::ZERO;
    }
    let total: Duration = durations.iter().sum();
    match u32::try_from(durations.len()) {
        Ok(count) => total / count,
        Err(_) => Duration::from_secs_f64(total.as_secs_f64() / durations.len() as f64),
    }
}

/// Sequential time divided by parallel time.
pub fn speedup(sequential: Duration, parallel: Duration) -> f64 {
    sequential.as_secs_f64() / parallel.as_secs_f64()
}

/// Time with one worker divided by time with many workers of the same strategy.
pub fn scalability(one_worker: Duration, many_workers: Duration) -> f64 {
    one_worker.as_secs_f64() / many_workers.as_secs_f64()
}

/// Average cost of spawning `workers` threads, meeting once at a [`RoundBarrier`]
/// whose action bumps a counter, and joining them again.
pub fn barrier_overhead(workers: usize, trials: usize) -> Result<Duration> {
    if workers == 0 || trials == 0 {
        return Err(JacobiError::invalid_input(
            "overhead measurement needs at least one worker and one trial",
        ));
    }

    let rounds = AtomicUsize::new(0);
    let mut durations = Vec::with_capacity(trials);
    for _ in 0..trials {
        let barrier = RoundBarrier::new(workers, || {
            rounds.fetch_add(1, Ordering::Relaxed);
        });
        let start = Instant::now();
        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    barrier.wait();
                });
            }
        });
        durations.push(start.elapsed());
    }
    debug_assert_eq!(rounds.load(Ordering::Relaxed), trials);

    let average = average(&durations);
    log::info!("barrier overhead with {workers} workers: {average:?}");
    Ok(average)
}
