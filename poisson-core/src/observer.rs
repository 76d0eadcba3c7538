//! Per-sweep diagnostics hook.
//!
//! The solver calls [`SweepObserver::on_sweep`] once after every completed
//! sweep. Observers cannot return errors; a sink that does I/O has to absorb
//! its own failures.

pub trait SweepObserver {
    fn on_sweep(&mut self, iteration: usize, metric: f64);
}

/// Discards every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl SweepObserver for NoopObserver {
    fn on_sweep(&mut self, _iteration: usize, _metric: f64) {}
}

impl<F> SweepObserver for F
where
    F: FnMut(usize, f64),
{
    fn on_sweep(&mut self, iteration: usize, metric: f64) {
        self(iteration, metric)
    }
}

/// Keeps every `(iteration, metric)` pair in memory.
#[derive(Clone, Debug, Default)]
pub struct ConvergenceHistory {
    entries: Vec<(usize, f64)>,
}

impl ConvergenceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn metrics(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|&(_, m)| m)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<(usize, f64)> {
        self.entries.last().copied()
    }
}

impl SweepObserver for ConvergenceHistory {
    fn on_sweep(&mut self, iteration: usize, metric: f64) {
        self.entries.push((iteration, metric));
    }
}
