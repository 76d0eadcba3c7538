//! Five-point stencil weights and the in-place SOR sweep.

use crate::geometry::Spacing;
use crate::grid::Grid;

/// Axis weights of the discretised Laplacian. `kx + ky == 0.5`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients {
    pub kx: f64,
    pub ky: f64,
}

impl Coefficients {
    pub fn from_spacing(spacing: Spacing) -> Coefficients {
        let hx2 = spacing.hx * spacing.hx;
        let hy2 = spacing.hy * spacing.hy;
        let denom = 2.0 * (hx2 + hy2);
        Coefficients {
            kx: hx2 / denom,
            ky: hy2 / denom,
        }
    }
}

/// One Gauss-Seidel sweep with over-relaxation factor `omega`.
///
/// Interior cells are visited top-to-bottom, left-to-right and written back
/// immediately, so the row above and the cell to the left already carry this
/// sweep's values when a cell is updated. Boundary cells are only read, never
/// written.
pub fn sweep(potential: &mut Grid, source: &Grid, coeffs: Coefficients, omega: f64) {
    debug_assert_eq!(potential.dims(), source.dims());

    let (h, w) = potential.dims();
    if h < 3 || w < 3 {
        return;
    }
    let Coefficients { kx, ky } = coeffs;

    for row in 1..(h - 1) {
        for col in 1..(w - 1) {
            let old = potential.get(row, col);

            let new = ky * (potential.get(row, col + 1) + potential.get(row, col - 1))
                + kx * (potential.get(row + 1, col) + potential.get(row - 1, col))
                + kx * source.get(row, col);

            let delta = new - old;
            potential.set(row, col, old + omega * delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn coefficients_sum_to_one_half() {
        for (hx, hy) in [(1.0, 1.0), (0.1, 0.1), (0.5, 2.0), (3.0, 0.25)] {
            let c = Coefficients::from_spacing(Spacing { hx, hy });
            assert_relative_eq!(c.kx + c.ky, 0.5, epsilon = 1e-15);
        }
        let c = Coefficients::from_spacing(Spacing::uniform(0.1));
        assert_relative_eq!(c.kx, 0.25, epsilon = 1e-15);
        assert_relative_eq!(c.ky, 0.25, epsilon = 1e-15);
    }

    #[test]
    fn unequal_spacing_weights_axes_differently() {
        let c = Coefficients::from_spacing(Spacing { hx: 2.0, hy: 1.0 });
        assert_relative_eq!(c.kx, 0.4);
        assert_relative_eq!(c.ky, 0.1);
    }

    #[test]
    fn sweep_uses_values_updated_earlier_in_the_same_sweep() {
        // 3x4 grid: interior cells (1,1) then (1,2).
        let mut p = Grid::zeros(3, 4);
        let mut s = Grid::zeros(3, 4);
        s.set(1, 1, 4.0);
        let c = Coefficients::from_spacing(Spacing::default());

        sweep(&mut p, &s, c, 1.0);

        // (1,1): 0.25 * 4 = 1.0
        assert_eq!(p.get(1, 1), 1.0);
        // (1,2) sees the fresh left neighbour: 0.25 * 1.0
        assert_eq!(p.get(1, 2), 0.25);
    }

    #[test]
    fn over_relaxation_scales_the_correction() {
        let mut p = Grid::zeros(3, 3);
        let mut s = Grid::zeros(3, 3);
        s.set(1, 1, 8.0);
        let c = Coefficients::from_spacing(Spacing::default());

        sweep(&mut p, &s, c, 1.5);
        // plain update would be 2.0; over-relaxed is 0 + 1.5 * 2.0
        assert_eq!(p.get(1, 1), 3.0);
    }

    #[test]
    fn boundary_is_left_untouched() {
        let mut p = Grid::filled(4, 4, 5.0);
        let s = Grid::filled(4, 4, 1.0);
        let before = p.clone();
        sweep(&mut p, &s, Coefficients::from_spacing(Spacing::default()), 1.2);
        for row in 0..4 {
            for col in 0..4 {
                if p.is_boundary(row, col) {
                    assert_eq!(p.get(row, col).to_bits(), before.get(row, col).to_bits());
                }
            }
        }
    }
}
