//! The relaxation loop: owns the fields for one run and applies the
//! stopping policy.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};
use crate::geometry::{self, Geometry, Spacing};
use crate::grid::Grid;
use crate::monitor::{Monitor, Status};
use crate::observer::{NoopObserver, SweepObserver};
use crate::stencil::{self, Coefficients};

/// Numeric knobs for one run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Over-relaxation factor, in (0, 2). 1.0 is plain Gauss-Seidel.
    pub omega: f64,
    /// Stop once the change in total squared potential is at or below this.
    pub tolerance: f64,
    /// Sweeps allowed before the run is reported as diverged.
    pub max_iterations: usize,
    /// Starting value of every interior cell.
    pub initial_fill: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            omega: 1.94,
            tolerance: 1e-3,
            max_iterations: 100_000,
            initial_fill: 0.0,
        }
    }
}

impl SolverConfig {
    pub fn with_omega(mut self, omega: f64) -> Self {
        self.omega = omega;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_initial_fill(mut self, initial_fill: f64) -> Self {
        self.initial_fill = initial_fill;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.omega.is_finite() && self.omega > 0.0 && self.omega < 2.0) {
            return Err(SolverError::InvalidRelaxationFactor(self.omega));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(SolverError::InvalidTolerance(self.tolerance));
        }
        if self.max_iterations == 0 {
            return Err(SolverError::InvalidIterationLimit);
        }
        if !self.initial_fill.is_finite() {
            return Err(SolverError::InvalidInitialFill(self.initial_fill));
        }
        Ok(())
    }
}

/// Report for one completed sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sweep {
    /// Zero-based index of the sweep.
    pub iteration: usize,
    pub metric: f64,
    /// Total squared potential after the sweep.
    pub sum_of_squares: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DivergenceReason {
    IterationLimit,
    NonFinite,
}

/// How a run ended. Only a converged run hands out its grid.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Converged {
        grid: Grid,
        iterations: usize,
        metric: f64,
    },
    Diverged {
        last_metric: f64,
        iterations: usize,
        reason: DivergenceReason,
    },
}

impl Outcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, Outcome::Converged { .. })
    }

    pub fn iterations(&self) -> usize {
        match self {
            Outcome::Converged { iterations, .. } | Outcome::Diverged { iterations, .. } => {
                *iterations
            }
        }
    }

    /// Final metric for a converged run, last observed metric otherwise.
    pub fn metric(&self) -> f64 {
        match self {
            Outcome::Converged { metric, .. } => *metric,
            Outcome::Diverged { last_metric, .. } => *last_metric,
        }
    }

    pub fn grid(&self) -> Option<&Grid> {
        match self {
            Outcome::Converged { grid, .. } => Some(grid),
            Outcome::Diverged { .. } => None,
        }
    }

    /// `(grid, iterations)` on convergence, `DidNotConverge` otherwise.
    pub fn into_result(self) -> Result<(Grid, usize)> {
        match self {
            Outcome::Converged {
                grid, iterations, ..
            } => Ok((grid, iterations)),
            Outcome::Diverged {
                last_metric,
                iterations,
                ..
            } => Err(SolverError::DidNotConverge {
                iterations,
                last_metric,
            }),
        }
    }
}

/// State of a single run. Built fresh per run; `run` consumes it.
#[derive(Clone, Debug)]
pub struct Solver {
    potential: Grid,
    source: Grid,
    coeffs: Coefficients,
    config: SolverConfig,
    monitor: Monitor,
    iterations: usize,
}

impl Solver {
    pub fn new(geometry: &Geometry, config: SolverConfig) -> Result<Solver> {
        config.validate()?;
        let source = geometry.source_field()?;

        let mut potential = Grid::filled(geometry.height, geometry.width, config.initial_fill);
        potential.zero_boundary();

        log::debug!(
            "solver ready: {}x{} grid, {} source cells, omega={}, tol={:e}",
            geometry.height,
            geometry.width,
            geometry.sources.len(),
            config.omega,
            config.tolerance
        );

        Ok(Solver::assemble(potential, source, geometry.spacing, config))
    }

    /// Starts from caller-built fields. The potential's boundary ring is
    /// zeroed; `config.initial_fill` is ignored.
    pub fn from_fields(
        mut potential: Grid,
        source: Grid,
        spacing: Spacing,
        config: SolverConfig,
    ) -> Result<Solver> {
        config.validate()?;
        spacing.validate()?;
        let (height, width) = potential.dims();
        geometry::validate_dims(height, width)?;
        if source.dims() != potential.dims() {
            return Err(SolverError::DimensionMismatch {
                potential: potential.dims(),
                source_dims: source.dims(),
            });
        }

        for row in 0..height {
            for col in 0..width {
                let value = source.get(row, col);
                if !value.is_finite() {
                    return Err(SolverError::InvalidSourceValue { row, col, value });
                }
                if value != 0.0 && source.is_boundary(row, col) {
                    return Err(SolverError::SourceOutsideInterior {
                        row,
                        col,
                        height,
                        width,
                    });
                }
            }
        }
        if let Some(&value) = potential.as_slice().iter().find(|v| !v.is_finite()) {
            return Err(SolverError::InvalidInitialFill(value));
        }

        potential.zero_boundary();
        Ok(Solver::assemble(potential, source, spacing, config))
    }

    fn assemble(potential: Grid, source: Grid, spacing: Spacing, config: SolverConfig) -> Solver {
        Solver {
            potential,
            source,
            coeffs: Coefficients::from_spacing(spacing),
            monitor: Monitor::new(config.tolerance),
            config,
            iterations: 0,
        }
    }

    /// Builds a solver for `geometry` and runs it without diagnostics.
    pub fn solve(geometry: &Geometry, config: SolverConfig) -> Result<Outcome> {
        Ok(Solver::new(geometry, config)?.run(&mut NoopObserver))
    }

    // ---- Accessors ----

    pub fn potential(&self) -> &Grid {
        &self.potential
    }

    pub fn source(&self) -> &Grid {
        &self.source
    }

    pub fn coefficients(&self) -> Coefficients {
        self.coeffs
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Number of completed sweeps.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn metric(&self) -> f64 {
        self.monitor.metric()
    }

    pub fn status(&self) -> Status {
        self.monitor.status()
    }

    // ---- Core loop ----

    /// One monitored sweep. Works past convergence too; the status stays
    /// `Converged` once reached.
    pub fn step(&mut self) -> Sweep {
        let sum_before = self.potential.sum_of_squares();
        stencil::sweep(&mut self.potential, &self.source, self.coeffs, self.config.omega);
        let sum_after = self.potential.sum_of_squares();

        let metric = self.monitor.measure(sum_before, sum_after);
        let iteration = self.iterations;
        self.iterations += 1;

        log::trace!("sweep {iteration}: metric = {metric:.6e}");

        Sweep {
            iteration,
            metric,
            sum_of_squares: sum_after,
        }
    }

    /// Sweeps until the monitor converges, the metric stops being finite, or
    /// `max_iterations` sweeps have run in total. Returns `None` on
    /// convergence. Calling it again on a stopped solver sweeps nothing.
    pub fn run_until<O>(&mut self, observer: &mut O) -> Option<DivergenceReason>
    where
        O: SweepObserver + ?Sized,
    {
        if self.iterations > 0 && !self.monitor.metric().is_finite() {
            return Some(DivergenceReason::NonFinite);
        }

        while !self.monitor.is_converged() {
            if self.iterations >= self.config.max_iterations {
                log::warn!(
                    "no convergence after {} sweeps (metric {:.6e} > tol {:e})",
                    self.iterations,
                    self.monitor.metric(),
                    self.config.tolerance
                );
                return Some(DivergenceReason::IterationLimit);
            }

            let sweep = self.step();
            observer.on_sweep(sweep.iteration, sweep.metric);

            if !sweep.metric.is_finite() || !sweep.sum_of_squares.is_finite() {
                log::warn!(
                    "potential blew up at sweep {} (sum of squares {})",
                    sweep.iteration,
                    sweep.sum_of_squares
                );
                return Some(DivergenceReason::NonFinite);
            }
        }

        log::debug!(
            "converged after {} sweeps (metric {:.6e})",
            self.iterations,
            self.monitor.metric()
        );
        None
    }

    /// Runs to a stop via [`Solver::run_until`] and hands over the result.
    pub fn run<O>(mut self, observer: &mut O) -> Outcome
    where
        O: SweepObserver + ?Sized,
    {
        match self.run_until(observer) {
            None => Outcome::Converged {
                iterations: self.iterations,
                metric: self.monitor.metric(),
                grid: self.potential,
            },
            Some(reason) => Outcome::Diverged {
                last_metric: self.monitor.metric(),
                iterations: self.iterations,
                reason,
            },
        }
    }
}
