//! Stopping criterion based on the relative change between successive iterates.

use serde::{Deserialize, Serialize};

use crate::error::{JacobiError, Result};

/// Computes `||current - previous||₂ / ||current||₂` without mutating either input.
///
/// Fails with [`JacobiError::DivisionDegenerate`] when `current` has zero norm.
pub fn relative_change(current: &[f64], previous: &[f64]) -> Result<f64> {
    if current.is_empty() {
        return Err(JacobiError::dimension_mismatch("iterate length", 1, 0));
    }
    if current.len() != previous.len() {
        return Err(JacobiError::dimension_mismatch(
            "previous iterate length",
            current.len(),
            previous.len(),
        ));
    }

    let mut norm_sq = 0.0f64;
    let mut diff_sq = 0.0f64;
    for (c, p) in current.iter().zip(previous) {
        norm_sq += c * c;
        diff_sq += (c - p) * (c - p);
    }

    if norm_sq == 0.0 {
        return Err(JacobiError::DivisionDegenerate);
    }
    Ok(diff_sq.sqrt() / norm_sq.sqrt())
}

/// Outcome of evaluating the stopping criterion for one iteration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceResult {
    /// Relative change, or `None` when the current iterate had zero norm.
    pub epsilon: Option<f64>,
    /// Whether `epsilon <= tolerance`.
    pub converged: bool,
}

/// Tolerance-based stopping rule. A negative tolerance disables the check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StoppingCriterion {
    tolerance: f64,
}

impl StoppingCriterion {
    /// Wraps a tolerance; negative values produce a disabled criterion.
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// The configured tolerance, including a negative "disabled" sentinel.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Solvers skip [`check`](Self::check) entirely when this is false.
    pub fn is_enabled(&self) -> bool {
        self.tolerance >= 0.0
    }

    /// Compares two iterates. A zero-norm `current` counts as "not converged".
    pub fn check(&self, current: &[f64], previous: &[f64]) -> ConvergenceResult {
        match relative_change(current, previous) {
            Ok(epsilon) => ConvergenceResult {
                epsilon: Some(epsilon),
                converged: self.is_enabled() && epsilon <= self.tolerance,
            },
            Err(_) => ConvergenceResult {
                epsilon: None,
                converged: false,
            },
        }
    }
}
