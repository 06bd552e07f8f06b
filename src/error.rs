use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for `jacobirs` operations.
#[derive(Debug, Error)]
pub enum JacobiError {
    /// Raised when a size, worker count or value range is outside its valid domain.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Human-readable description of the rejected value.
        reason: String,
    },

    /// Raised when provided matrices or vectors have incompatible dimensions.
    #[error("dimension mismatch in {context}: expected {expected} but found {found}")]
    DimensionMismatch {
        /// Human-readable context describing the operation.
        context: &'static str,
        /// The required dimension.
        expected: usize,
        /// The dimension that was actually supplied.
        found: usize,
    },

    /// Raised before iterating when a diagonal coefficient cannot be divided by.
    #[error("diagonal entry of row {row} is {value}; Jacobi iteration requires a non-zero finite diagonal")]
    ZeroDiagonal { row: usize, value: f64 },

    /// Raised when the relative change is requested for an all-zero iterate.
    #[error("relative change is undefined because the current iterate has zero norm")]
    DivisionDegenerate,

    /// Raised when a system or timing file cannot be read or written.
    #[error("i/o failure on `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised when a system file contains a token that is not a number, or too few numbers.
    #[error("could not parse `{}`: {detail}", .path.display())]
    Parse { path: PathBuf, detail: String },

    /// Raised when the fork-join worker pool cannot be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Raised when a barrier worker thread unwinds instead of returning.
    #[error("barrier worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}

impl JacobiError {
    /// Helper to format a [`DimensionMismatch`](JacobiError::DimensionMismatch) error.
    pub fn dimension_mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            found,
        }
    }

    /// Helper to reject a value outside its valid domain.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error was caused by the caller's input rather than by the run itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::DimensionMismatch { .. } | Self::ZeroDiagonal { .. }
        )
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, JacobiError>;
