//! Dense linear systems `Ax = b` and the per-row Jacobi update shared by every solver.

use nalgebra::{DMatrix, DVector};

use crate::error::{JacobiError, Result};

/// A square coefficient matrix paired with its right-hand side.
///
/// The system is immutable once built and is shared by reference with every
/// worker of a solve. Coefficients are stored transposed so that each equation
/// (row of `A`) is a contiguous slice of the column-major backing buffer.
#[derive(Clone, Debug)]
pub struct LinearSystem {
    rows: DMatrix<f64>,
    rhs: DVector<f64>,
}

impl LinearSystem {
    /// Builds a system after validating that `matrix` is square and matches `rhs`.
    pub fn new(matrix: DMatrix<f64>, rhs: DVector<f64>) -> Result<Self> {
        let n = matrix.nrows();
        if n == 0 {
            return Err(JacobiError::invalid_input(
                "linear system size must be at least 1",
            ));
        }
        if matrix.ncols() != n {
            return Err(JacobiError::dimension_mismatch(
                "matrix columns",
                n,
                matrix.ncols(),
            ));
        }
        if rhs.len() != n {
            return Err(JacobiError::dimension_mismatch(
                "right-hand side length",
                n,
                rhs.len(),
            ));
        }

        Ok(Self {
            rows: matrix.transpose(),
            rhs,
        })
    }

    /// Builds a system from a row-major coefficient slice of length `n * n`.
    pub fn from_row_slice(n: usize, coefficients: &[f64], rhs: &[f64]) -> Result<Self> {
        if n == 0 {
            return Err(JacobiError::invalid_input(
                "linear system size must be at least 1",
            ));
        }
        let expected = coefficient_count(n)?;
        if coefficients.len() != expected {
            return Err(JacobiError::dimension_mismatch(
                "coefficient count",
                expected,
                coefficients.len(),
            ));
        }
        // A row-major slice read as column-major is already the transpose.
        let rows = DMatrix::from_column_slice(n, n, coefficients);
        if rhs.len() != n {
            return Err(JacobiError::dimension_mismatch(
                "right-hand side length",
                n,
                rhs.len(),
            ));
        }
        Ok(Self {
            rows,
            rhs: DVector::from_vec(rhs.to_vec()),
        })
    }

    /// Number of unknowns.
    pub fn size(&self) -> usize {
        self.rhs.len()
    }

    /// Coefficients of equation `i`, i.e. row `i` of `A`.
    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.size();
        &self.rows.as_slice()[i * n..(i + 1) * n]
    }

    /// Coefficient `A[i][j]`.
    pub fn coefficient(&self, i: usize, j: usize) -> f64 {
        self.rows[(j, i)]
    }

    /// Returns a copy of the coefficient matrix in its natural orientation.
    pub fn matrix(&self) -> DMatrix<f64> {
        self.rows.transpose()
    }

    /// Right-hand side `b`.
    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }

    /// Rejects zero or non-finite diagonal entries, reporting the first offending row.
    pub fn validate_diagonal(&self) -> Result<()> {
        for i in 0..self.size() {
            let value = self.coefficient(i, i);
            if value == 0.0 || !value.is_finite() {
                return Err(JacobiError::ZeroDiagonal { row: i, value });
            }
        }
        Ok(())
    }

    /// Strict row diagonal dominance: `|A[i][i]| > Σ_{j≠i} |A[i][j]|` for every row.
    pub fn is_diagonally_dominant(&self) -> bool {
        (0..self.size()).all(|i| {
            let row = self.row(i);
            let off_diagonal: f64 = row
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, a)| a.abs())
                .sum();
            row[i].abs() > off_diagonal
        })
    }

    /// One Jacobi update for row `i` given the previous iterate:
    /// `(b[i] - Σ_{j≠i} A[i][j] * previous[j]) / A[i][i]`.
    #[inline]
    pub fn jacobi_row(&self, i: usize, previous: &[f64]) -> f64 {
        let row = self.row(i);
        let mut sum = 0.0;
        for (j, (a, x)) in row.iter().zip(previous).enumerate() {
            if j != i {
                sum += a * x;
            }
        }
        (self.rhs[i] - sum) / row[i]
    }

    /// Euclidean norm of `Ax - b`; used to report how well an iterate solves the system.
    pub fn residual_norm(&self, x: &DVector<f64>) -> Result<f64> {
        if x.len() != self.size() {
            return Err(JacobiError::dimension_mismatch(
                "iterate length",
                self.size(),
                x.len(),
            ));
        }
        let squared: f64 = (0..self.size())
            .map(|i| {
                let ax: f64 = self.row(i).iter().zip(x.iter()).map(|(a, v)| a * v).sum();
                (ax - self.rhs[i]).powi(2)
            })
            .sum();
        Ok(squared.sqrt())
    }
}

/// Number of entries in an `n × n` matrix, rejecting sizes whose square overflows.
pub(crate) fn coefficient_count(n: usize) -> Result<usize> {
    n.checked_mul(n).ok_or_else(|| {
        JacobiError::invalid_input(format!("a {n} x {n} coefficient matrix is too large"))
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn rows_are_contiguous_equations() {
        let matrix = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 2.0, 3.0]);
        let system = LinearSystem::new(matrix.clone(), DVector::from_vec(vec![1.0, 2.0])).unwrap();
        assert_eq!(system.row(0), &[4.0, 1.0]);
        assert_eq!(system.row(1), &[2.0, 3.0]);
        assert_eq!(system.coefficient(1, 0), 2.0);
        assert_eq!(system.matrix(), matrix);
    }

    #[test]
    fn from_row_slice_matches_new() {
        let a = LinearSystem::from_row_slice(2, &[4.0, 1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap();
        let b = LinearSystem::new(
            DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 2.0, 3.0]),
            DVector::from_vec(vec![1.0, 2.0]),
        )
        .unwrap();
        assert_eq!(a.matrix(), b.matrix());
        assert_eq!(a.rhs(), b.rhs());
    }

    #[test]
    fn rejects_bad_shapes() {
        let empty = LinearSystem::new(DMatrix::zeros(0, 0), DVector::zeros(0));
        assert!(matches!(empty, Err(JacobiError::InvalidInput { .. })));

        let short_rhs = LinearSystem::new(DMatrix::identity(3, 3), DVector::zeros(2));
        assert!(matches!(
            short_rhs,
            Err(JacobiError::DimensionMismatch {
                expected: 3,
                found: 2,
                ..
            })
        ));

        let rectangular = LinearSystem::new(DMatrix::zeros(2, 3), DVector::zeros(2));
        assert!(matches!(
            rectangular,
            Err(JacobiError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn oversized_dimension_is_rejected_before_allocating() {
        let result = LinearSystem::from_row_slice(usize::MAX, &[], &[]);
        assert!(matches!(result, Err(JacobiError::InvalidInput { .. })));
        assert_eq!(coefficient_count(3).unwrap(), 9);
    }

    #[test]
    fn zero_diagonal_is_reported_with_its_row() {
        let system =
            LinearSystem::from_row_slice(3, &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0], &[1.0; 3])
                .unwrap();
        match system.validate_diagonal() {
            Err(JacobiError::ZeroDiagonal { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, 0.0);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn dominance_check() {
        let dominant = LinearSystem::from_row_slice(2, &[4.0, 1.0, 1.0, 3.0], &[0.0; 2]).unwrap();
        assert!(dominant.is_diagonally_dominant());
        let weak = LinearSystem::from_row_slice(2, &[1.0, 2.0, 1.0, 3.0], &[0.0; 2]).unwrap();
        assert!(!weak.is_diagonally_dominant());
    }

    #[test]
    fn jacobi_row_skips_the_diagonal() {
        let system = LinearSystem::from_row_slice(2, &[4.0, 1.0, 1.0, 3.0], &[6.0, 5.0]).unwrap();
        assert_relative_eq!(system.jacobi_row(0, &[100.0, 2.0]), 1.0);
        assert_relative_eq!(system.jacobi_row(1, &[2.0, 100.0]), 1.0);
    }

    #[test]
    fn residual_of_exact_solution_is_zero() {
        let system = LinearSystem::from_row_slice(2, &[4.0, 1.0, 1.0, 3.0], &[6.0, 5.0]).unwrap();
        let exact = DVector::from_vec(vec![13.0 / 11.0, 14.0 / 11.0]);
        assert_relative_eq!(system.residual_norm(&exact).unwrap(), 0.0, epsilon = 1e-12);
    }
}
