//! Steady-state 2D electrostatic potential by successive over-relaxation.
//!
//! A [`Geometry`] describes the rectangular domain and its fixed-voltage
//! source cells; a [`Solver`] owns the potential field for one run and sweeps
//! it in place until the change in total squared potential falls to the
//! configured tolerance. Edge cells stay at zero throughout.
//!
//! ```
//! use poisson_core::{Geometry, Solver, SolverConfig};
//!
//! let geometry = Geometry::new(5, 5).with_source(2, 2, 100.0);
//! let config = SolverConfig::default().with_omega(1.0).with_tolerance(1e-6);
//! let (grid, iterations) = Solver::solve(&geometry, config)?.into_result()?;
//! assert!(iterations > 1);
//! assert!(grid.get(2, 2) > grid.get(1, 1));
//! # Ok::<(), poisson_core::SolverError>(())
//! ```

pub mod error;
pub mod geometry;
pub mod grid;
pub mod monitor;
pub mod observer;
pub mod solver;
pub mod stencil;

pub use error::{Result, SolverError};
pub use geometry::{Geometry, SourceCell, Spacing};
pub use grid::Grid;
pub use monitor::{Monitor, Status};
pub use observer::{ConvergenceHistory, NoopObserver, SweepObserver};
pub use solver::{DivergenceReason, Outcome, Solver, SolverConfig, Sweep};
pub use stencil::{Coefficients, sweep};
