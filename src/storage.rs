//! Loading systems from text files and appending timing results.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nalgebra::{DMatrix, DVector};

use crate::error::{JacobiError, Result};
use crate::solving::Strategy;
use crate::system::{coefficient_count, LinearSystem};

fn read_numbers(path: &Path, count: usize) -> Result<Vec<f64>> {
    let text = fs::read_to_string(path).map_err(|source| JacobiError::io(path, source))?;
    let mut values = Vec::with_capacity(count);
    for token in text.split_whitespace().take(count) {
        let value = token.parse::<f64>().map_err(|_| JacobiError::Parse {
            path: path.to_path_buf(),
            detail: format!("`{token}` is not a number"),
        })?;
        values.push(value);
    }
    if values.len() < count {
        return Err(JacobiError::Parse {
            path: path.to_path_buf(),
            detail: format!("expected {count} numbers but found {}", values.len()),
        });
    }
    Ok(values)
}

/// Reads an `n × n` matrix stored as whitespace-separated numbers in row-major order.
pub fn read_matrix(n: usize, path: impl AsRef<Path>) -> Result<DMatrix<f64>> {
    let values = read_numbers(path.as_ref(), coefficient_count(n)?)?;
    Ok(DMatrix::from_row_slice(n, n, &values))
}

/// Reads a length-`n` vector stored as whitespace-separated numbers.
pub fn read_vector(n: usize, path: impl AsRef<Path>) -> Result<DVector<f64>> {
    let values = read_numbers(path.as_ref(), n)?;
    Ok(DVector::from_vec(values))
}

/// Reads a matrix file and a right-hand-side file into a validated system.
pub fn read_system(
    n: usize,
    matrix_path: impl AsRef<Path>,
    rhs_path: impl AsRef<Path>,
) -> Result<LinearSystem> {
    if n == 0 {
        return Err(JacobiError::invalid_input(
            "linear system size must be at least 1",
        ));
    }
    LinearSystem::new(read_matrix(n, matrix_path)?, read_vector(n, rhs_path)?)
}

/// Result file for a run: `<prefix><size><tag>.csv`.
pub fn results_path(prefix: &str, size: usize, strategy: Strategy) -> PathBuf {
    PathBuf::from(format!("{prefix}{size}{}.csv", strategy.tag()))
}

/// Average time in microseconds, the unit written to result files.
pub fn micros(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1e6
}

/// Appends one result line: `<workers>\t<avg>` for parallel runs, `<avg>` otherwise.
pub fn append_timing(path: impl AsRef<Path>, workers: Option<usize>, average: Duration) -> Result<()> {
    let line = match workers {
        Some(workers) => format!("{workers}\t{:.3}", micros(average)),
        None => format!("{:.3}", micros(average)),
    };
    append_line(path.as_ref(), &line)
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| JacobiError::io(path, source))?;
    writeln!(file, "{line}").map_err(|source| JacobiError::io(path, source))
}
