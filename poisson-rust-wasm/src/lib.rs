use poisson_core::{Geometry, NoopObserver, SolverConfig, Spacing, Status};
use wasm_bindgen::prelude::*;

/// Browser handle on one relaxation run. Sources and parameters are staged
/// on the geometry/config and take effect on `reset`.
#[wasm_bindgen]
pub struct Solver {
    geometry: Geometry,
    config: SolverConfig,
    inner: poisson_core::Solver,
}

#[wasm_bindgen]
impl Solver {
    #[wasm_bindgen(constructor)]
    pub fn new(height: usize, width: usize, hx: f64, hy: f64) -> Result<Solver, JsValue> {
        let geometry = Geometry::new(height, width).with_spacing(Spacing { hx, hy });
        let config = SolverConfig::default();
        let inner = build(&geometry, config)?;
        Ok(Solver {
            geometry,
            config,
            inner,
        })
    }

    // Parameters
    pub fn set_omega(&mut self, omega: f64) { self.config.omega = omega; }
    pub fn set_tolerance(&mut self, tol: f64) { self.config.tolerance = tol; }
    pub fn set_max_iterations(&mut self, n: usize) { self.config.max_iterations = n; }

    pub fn add_source(&mut self, row: usize, col: usize, value: f64) -> Result<(), JsValue> {
        if !self.geometry.is_interior(row, col) {
            return Err(JsValue::from_str(&format!(
                "source ({row}, {col}) is outside the interior"
            )));
        }
        self.geometry.add_source(row, col, value);
        Ok(())
    }

    pub fn clear_sources(&mut self) { self.geometry.sources.clear(); }

    /// Rebuilds the run from the staged geometry and parameters.
    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.inner = build(&self.geometry, self.config)?;
        Ok(())
    }

    pub fn height(&self) -> usize { self.geometry.height }
    pub fn width(&self) -> usize { self.geometry.width }
    pub fn iterations(&self) -> usize { self.inner.iterations() }
    pub fn converged(&self) -> bool { self.inner.status() == Status::Converged }

    // Copy-based JS access (reliable)
    pub fn get_field(&self) -> Vec<f64> {
        self.inner.potential().as_slice().to_vec()
    }

    // Sweep + timing (WASM-only)
    pub fn sweep(&mut self) -> SweepInfo {
        let t0 = now_ms();
        let s = self.inner.step();
        let t1 = now_ms();
        SweepInfo {
            iteration: s.iteration,
            metric: s.metric,
            compute_ms: t1 - t0,
            converged: self.converged(),
        }
    }

    /// Sweeps until converged, the metric blows up, or the sweep cap is hit.
    /// The reported iteration is the index of the last completed sweep.
    pub fn run_to_convergence(&mut self) -> SweepInfo {
        let t0 = now_ms();
        self.inner.run_until(&mut NoopObserver);
        let t1 = now_ms();
        last_sweep(&self.inner, t1 - t0)
    }
}

#[wasm_bindgen]
pub struct SweepInfo {
    iteration: usize,
    metric: f64,
    compute_ms: f64,
    converged: bool,
}

#[wasm_bindgen]
impl SweepInfo {
    pub fn iteration(&self) -> usize { self.iteration }
    pub fn metric(&self) -> f64 { self.metric }
    pub fn compute_ms(&self) -> f64 { self.compute_ms }
    pub fn converged(&self) -> bool { self.converged }
}

fn build(geometry: &Geometry, config: SolverConfig) -> Result<poisson_core::Solver, JsValue> {
    poisson_core::Solver::new(geometry, config).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn last_sweep(inner: &poisson_core::Solver, compute_ms: f64) -> SweepInfo {
    SweepInfo {
        iteration: inner.iterations().saturating_sub(1),
        metric: inner.metric(),
        compute_ms,
        converged: inner.status() == Status::Converged,
    }
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}
