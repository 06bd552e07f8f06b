//! Seeded generation of diagonally dominant benchmark systems.

use nalgebra::{DMatrix, DVector};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::error::{JacobiError, Result};
use crate::system::{coefficient_count, LinearSystem};

/// Value ranges and seed used to synthesize a benchmark system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorOptions {
    pub matrix_min: f64,
    pub matrix_max: f64,
    pub vector_min: f64,
    pub vector_max: f64,
    pub seed: u64,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            matrix_min: 0.0,
            matrix_max: 20.0,
            vector_min: 0.0,
            vector_max: 20.0,
            seed: 14,
        }
    }
}

impl GeneratorOptions {
    /// Replace the seed, keeping the value ranges.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generates the matrix and right-hand side described by these options.
    pub fn generate(&self, size: usize) -> Result<LinearSystem> {
        let matrix = generate_matrix(size, self.matrix_min, self.matrix_max, self.seed)?;
        let rhs = generate_vector(size, self.vector_min, self.vector_max, self.seed)?;
        LinearSystem::new(matrix, rhs)
    }
}

fn uniform(min: f64, max: f64) -> Result<Uniform<f64>> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(JacobiError::invalid_input(format!(
            "value range [{min}, {max}] is empty or not finite"
        )));
    }
    Ok(Uniform::new_inclusive(min, max))
}

fn check_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(JacobiError::invalid_input(
            "linear system size must be at least 1",
        ));
    }
    Ok(())
}

/// Generates a `size × size` matrix with entries drawn uniformly from `[min, max]`.
///
/// Every diagonal entry is then replaced by twice the sum of the magnitudes
/// drawn for its row, which makes the matrix strictly diagonally dominant
/// whenever a row has any non-zero draw.
pub fn generate_matrix(size: usize, min: f64, max: f64, seed: u64) -> Result<DMatrix<f64>> {
    check_size(size)?;
    let distribution = uniform(min, max)?;
    let mut values = Vec::with_capacity(coefficient_count(size)?);
    let mut rng = SmallRng::seed_from_u64(seed);

    for i in 0..size {
        let row_start = values.len();
        let mut magnitude = 0.0;
        for _ in 0..size {
            let value: f64 = distribution.sample(&mut rng);
            magnitude += value.abs();
            values.push(value);
        }
        values[row_start + i] = 2.0 * magnitude;
    }
    Ok(DMatrix::from_row_slice(size, size, &values))
}

/// Generates a vector with entries drawn uniformly from `[min, max]`.
pub fn generate_vector(size: usize, min: f64, max: f64, seed: u64) -> Result<DVector<f64>> {
    check_size(size)?;
    let distribution = uniform(min, max)?;
    let mut rng = SmallRng::seed_from_u64(seed);
    Ok(DVector::from_iterator(
        size,
        (0..size).map(|_| distribution.sample(&mut rng)),
    ))
}
