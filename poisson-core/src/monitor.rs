//! Stopping rule for the relaxation loop.

/// Loop state. `Converged` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    Converged,
}

/// Tracks the change in total squared potential between sweeps.
#[derive(Clone, Debug)]
pub struct Monitor {
    tolerance: f64,
    metric: f64,
    status: Status,
}

impl Monitor {
    /// Starts `Running` with a metric strictly above `tolerance`, so the
    /// first sweep always happens.
    pub fn new(tolerance: f64) -> Monitor {
        Monitor {
            tolerance,
            metric: initial_metric(tolerance),
            status: Status::Running,
        }
    }

    /// Records one completed sweep and returns `|sum_after - sum_before|`.
    pub fn measure(&mut self, sum_before: f64, sum_after: f64) -> f64 {
        self.metric = (sum_after - sum_before).abs();
        if self.metric <= self.tolerance {
            self.status = Status::Converged;
        }
        self.metric
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn metric(&self) -> f64 {
        self.metric
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_converged(&self) -> bool {
        self.status == Status::Converged
    }

    pub fn reset(&mut self) {
        *self = Monitor::new(self.tolerance);
    }
}

fn initial_metric(tolerance: f64) -> f64 {
    if tolerance < 1.0 { 1.0 } else { tolerance * 2.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running_above_tolerance() {
        for tol in [0.0, 1e-6, 0.1, 1.0, 250.0] {
            let m = Monitor::new(tol);
            assert_eq!(m.status(), Status::Running);
            assert!(m.metric() > tol);
        }
    }

    #[test]
    fn metric_is_absolute_difference() {
        let mut m = Monitor::new(0.5);
        assert_eq!(m.measure(10.0, 7.0), 3.0);
        assert_eq!(m.status(), Status::Running);
        assert_eq!(m.measure(7.0, 9.0), 2.0);
        assert_eq!(m.status(), Status::Running);
    }

    #[test]
    fn converges_when_metric_reaches_tolerance() {
        let mut m = Monitor::new(0.5);
        m.measure(4.0, 4.5);
        assert!(m.is_converged());

        let mut m = Monitor::new(0.0);
        m.measure(0.0, 0.0);
        assert!(m.is_converged());
    }

    #[test]
    fn nan_never_converges() {
        let mut m = Monitor::new(1.0);
        m.measure(1.0, f64::NAN);
        assert!(!m.is_converged());
    }

    #[test]
    fn reset_restores_sentinel() {
        let mut m = Monitor::new(0.1);
        m.measure(1.0, 1.0);
        m.reset();
        assert_eq!(m.status(), Status::Running);
        assert_eq!(m.metric(), 1.0);
    }
}
