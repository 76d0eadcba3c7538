//! Error type shared by every fallible operation in `poisson-core`.
//!
//! All variants except [`SolverError::DidNotConverge`] are raised while a
//! solver is being built, before the first sweep runs.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SolverError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("grid must be at least 3x3 to have an interior, got {height}x{width}")]
    InvalidDimensions { height: usize, width: usize },

    #[error("grid spacing must be finite and positive, got hx={hx}, hy={hy}")]
    InvalidSpacing { hx: f64, hy: f64 },

    #[error("source at ({row}, {col}) is outside the interior of a {height}x{width} grid")]
    SourceOutsideInterior {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },

    #[error("source at ({row}, {col}) has non-finite value {value}")]
    InvalidSourceValue { row: usize, col: usize, value: f64 },

    #[error("potential grid is {potential:?} but source field is {source_dims:?}")]
    DimensionMismatch {
        potential: (usize, usize),
        source_dims: (usize, usize),
    },

    #[error("over-relaxation factor must lie in (0, 2), got {0}")]
    InvalidRelaxationFactor(f64),

    #[error("tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),

    #[error("max_iterations must be at least 1")]
    InvalidIterationLimit,

    #[error("initial fill must be finite, got {0}")]
    InvalidInitialFill(f64),

    #[error("solver did not converge after {iterations} sweeps (last metric {last_metric:e})")]
    DidNotConverge { iterations: usize, last_metric: f64 },
}
