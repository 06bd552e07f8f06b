//! Command-line benchmark driver.
//!
//! Usage examples:
//!   jacobi solve thr 5000 100 -1 results/run_ 8
//!   jacobi solve seq 5000 100 1e-6 results/run_ --trials 3
//!   jacobi solve pf 2 50 1e-6 out_ 2 --matrix a.txt --vector b.txt --json
//!   jacobi compare 2000 100 -1 8
//!   jacobi overhead --max-workers 32 --output overhead.csv

use std::fmt::Display;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use jacobirs::generate::GeneratorOptions;
use jacobirs::harness::{barrier_overhead, run_trials, scalability, speedup};
use jacobirs::storage::{append_timing, micros, read_system, results_path};
use jacobirs::{ExecutionConfig, JacobiError, Strategy};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jacobi", about = "Benchmark Jacobi iteration strategies", version)]
struct Cli {
    /// Enable debug logging for the solver crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a system several times and append the average time to a results file
    Solve {
        /// Strategy: seq, thr (barrier threads) or pf (parallel-for)
        mode: Strategy,

        /// Number of unknowns
        size: usize,

        /// Maximum iterations; non-positive values fall back to the system size
        #[arg(allow_hyphen_values = true)]
        iterations: i64,

        /// Relative-change tolerance; a negative value disables the check
        #[arg(allow_hyphen_values = true)]
        tolerance: f64,

        /// Prefix of the results file (`<prefix><size><mode>.csv`)
        output: String,

        /// Worker threads (required for thr and pf, rejected for seq)
        threads: Option<usize>,

        /// Number of timed trials to average
        #[arg(long, default_value_t = 5)]
        trials: usize,

        /// Seed for the generated system
        #[arg(long, default_value_t = 14)]
        seed: u64,

        /// Load the coefficient matrix from a whitespace-separated file
        #[arg(long, requires = "vector")]
        matrix: Option<PathBuf>,

        /// Load the right-hand side from a whitespace-separated file
        #[arg(long, requires = "matrix")]
        vector: Option<PathBuf>,

        /// Print the trial summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run every strategy on one generated system and print speedup and scalability
    Compare {
        /// Number of unknowns
        size: usize,

        /// Maximum iterations; non-positive values fall back to the system size
        #[arg(allow_hyphen_values = true)]
        iterations: i64,

        /// Relative-change tolerance; a negative value disables the check
        #[arg(allow_hyphen_values = true)]
        tolerance: f64,

        /// Worker threads for the parallel strategies
        threads: usize,

        /// Number of timed trials to average
        #[arg(long, default_value_t = 5)]
        trials: usize,

        /// Seed for the generated system
        #[arg(long, default_value_t = 14)]
        seed: u64,
    },

    /// Time spawning N threads, one barrier rendezvous and joining, for N = 2, 4, ...
    Overhead {
        /// Largest worker count to measure
        #[arg(long, default_value_t = 32)]
        max_workers: usize,

        /// Trials averaged per worker count
        #[arg(long, default_value_t = 5)]
        trials: usize,

        /// File the `<workers>\t<avg>` lines are appended to
        #[arg(long, default_value = "overhead.csv")]
        output: PathBuf,
    },
}

/// Distinct exit statuses per failure class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Arguments = 2,
    Input = 3,
    Solve = 4,
    Output = 8,
}

fn fail(stage: Stage, error: impl Display) -> ! {
    eprintln!("error: {error}");
    process::exit(stage as i32);
}

/// Exit status for a failed solve: caller mistakes are argument errors.
fn solve_stage(error: &JacobiError) -> Stage {
    if error.is_input_error() {
        Stage::Arguments
    } else {
        Stage::Solve
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "jacobirs=debug,jacobi=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve {
            mode,
            size,
            iterations,
            tolerance,
            output,
            threads,
            trials,
            seed,
            matrix,
            vector,
            json,
        } => {
            let workers = match (mode.is_parallel(), threads) {
                (true, Some(workers)) => workers,
                (true, None) => fail(Stage::Arguments, format!("mode {mode} needs a thread count")),
                (false, Some(_)) => fail(Stage::Arguments, "mode seq does not take a thread count"),
                (false, None) => 1,
            };
            if size < 1 {
                fail(Stage::Arguments, "the size of the linear system must be >= 1");
            }

            println!("MODE: {mode}");
            println!("SIZE: {size}");
            println!("ITERATIONS: {iterations}");
            if tolerance < 0.0 {
                println!("TOLERANCE: DISABLED");
            } else {
                println!("TOLERANCE: {tolerance}");
            }
            if mode.is_parallel() {
                println!("NUMBER OF THREADS: {workers}");
            }

            let system = match (matrix, vector) {
                (Some(matrix), Some(vector)) => read_system(size, matrix, vector),
                _ => GeneratorOptions::default().with_seed(seed).generate(size),
            }
            .unwrap_or_else(|error| fail(Stage::Input, error));

            let max_iterations = usize::try_from(iterations).unwrap_or(0);
            let config = ExecutionConfig::new(max_iterations, tolerance).with_workers(workers);
            let summary = run_trials(mode, &system, &config, trials)
                .unwrap_or_else(|error| fail(solve_stage(&error), error));

            if let Ok(residual) = system.residual_norm(&summary.last.solution) {
                println!("RESIDUAL ||Ax - b||: {residual:e}");
            }
            println!(
                "{mode} AVG_TIME: {:.3} us with {trials} trials ({} iterations, converged: {})",
                micros(summary.average),
                summary.last.iterations,
                summary.last.converged
            );
            if json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(text) => println!("{text}"),
                    Err(error) => fail(Stage::Output, error),
                }
            }

            let path = results_path(&output, size, mode);
            let column = mode.is_parallel().then_some(workers);
            append_timing(&path, column, summary.average)
                .unwrap_or_else(|error| fail(Stage::Output, error));
        }
        Commands::Compare {
            size,
            iterations,
            tolerance,
            threads,
            trials,
            seed,
        } => {
            let system = GeneratorOptions::default()
                .with_seed(seed)
                .generate(size)
                .unwrap_or_else(|error| fail(Stage::Arguments, error));
            let config = ExecutionConfig::new(usize::try_from(iterations).unwrap_or(0), tolerance);
            let average = |strategy: Strategy, workers: usize| {
                run_trials(strategy, &system, &config.clone().with_workers(workers), trials)
                    .map(|summary| summary.average)
                    .unwrap_or_else(|error| fail(solve_stage(&error), error))
            };

            let sequential = average(Strategy::Sequential, 1);
            println!("{} AVG_TIME: {:.3} us", Strategy::Sequential, micros(sequential));
            for strategy in Strategy::ALL.into_iter().filter(|s| s.is_parallel()) {
                let one = average(strategy, 1);
                let many = average(strategy, threads);
                println!("{strategy} AVG_TIME: {:.3} us with {threads} threads", micros(many));
                println!(
                    "SPEEDUP (seq / {strategy}) = {:.3}",
                    speedup(sequential, many)
                );
                println!(
                    "SCALABILITY ({strategy} 1 thread / {threads} threads) = {:.3}",
                    scalability(one, many)
                );
            }
        }
        Commands::Overhead {
            max_workers,
            trials,
            output,
        } => {
            for workers in (2..=max_workers).step_by(2) {
                let average = barrier_overhead(workers, trials)
                    .unwrap_or_else(|error| fail(Stage::Arguments, error));
                println!("AVG_TIME {:.3} us with {workers} threads", micros(average));
                append_timing(&output, Some(workers), average)
                    .unwrap_or_else(|error| fail(Stage::Output, error));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn caller_mistakes_map_to_argument_status() {
        let workers = JacobiError::invalid_input("worker count 8 exceeds the 4 rows");
        assert_eq!(solve_stage(&workers), Stage::Arguments);
        let diagonal = JacobiError::ZeroDiagonal { row: 0, value: 0.0 };
        assert_eq!(solve_stage(&diagonal), Stage::Arguments);
    }

    #[test]
    fn run_failures_map_to_solve_status() {
        assert_eq!(solve_stage(&JacobiError::WorkerPanicked { worker: 1 }), Stage::Solve);
        let io = JacobiError::Io {
            path: PathBuf::from("x"),
            source: io::Error::new(io::ErrorKind::Other, "boom"),
        };
        assert_eq!(solve_stage(&io), Stage::Solve);
    }
}
