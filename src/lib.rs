//! Dense Jacobi iteration under three execution strategies.
//!
//! This crate solves `Ax = b` for a dense, diagonally dominant matrix with the
//! Jacobi method and runs the same per-row kernel three ways so their
//! synchronization costs can be compared:
//!
//! - a single-threaded baseline (`sequential` module),
//! - persistent native threads over static row blocks, synchronized every
//!   iteration by a barrier whose leader action swaps buffers and checks
//!   convergence (`threaded` and `barrier` modules), and
//! - a fork-join parallel loop on a rayon pool, one region per iteration
//!   (`parallel_for` module).
//!
//! Around the solvers sit the benchmark pieces: seeded system generation
//! (`generate`), text file loading and result persistence (`storage`) and a
//! trial-averaging driver (`harness`).
//!
//! # Quick start
//!
//! ```no_run
//! use jacobirs::generate::GeneratorOptions;
//! use jacobirs::{solve, ExecutionConfig, Strategy};
//!
//! let system = GeneratorOptions::default().generate(1_000).expect("valid generator options");
//! let config = ExecutionConfig::new(100, 1e-6).with_workers(4);
//!
//! let report = solve(Strategy::Barrier, &system, &config).expect("solvable system");
//! println!(
//!     "{} iterations in {:?}, converged: {}",
//!     report.iterations, report.elapsed, report.converged
//! );
//! ```

pub mod barrier;
pub mod convergence;
pub mod error;
pub mod generate;
pub mod harness;
pub mod options;
pub mod parallel_for;
pub mod partition;
pub mod sequential;
pub mod solving;
pub mod storage;
pub mod system;
pub mod threaded;

pub use error::{JacobiError, Result};
pub use options::{AbortHandle, ExecutionConfig};
pub use parallel_for::ParallelForSolver;
pub use sequential::SequentialSolver;
pub use solving::{solve, JacobiSolver, SolveReport, Strategy, Termination};
pub use system::LinearSystem;
pub use threaded::BarrierSolver;
