//! Dense row-major storage for the potential and source fields.

/// A `height x width` array of reals indexed by `(row, col)`.
///
/// Row 0, row `height - 1`, column 0 and column `width - 1` form the
/// boundary ring.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    height: usize,
    width: usize,
    data: Vec<f64>,
}

impl Grid {
    pub fn zeros(height: usize, width: usize) -> Grid {
        Grid::filled(height, width, 0.0)
    }

    pub fn filled(height: usize, width: usize, value: f64) -> Grid {
        Grid {
            height,
            width,
            data: vec![value; height * width],
        }
    }

    /// Builds a grid from a flat row-major buffer. Returns `None` when the
    /// buffer length does not match `height * width`.
    pub fn from_vec(height: usize, width: usize, data: Vec<f64>) -> Option<Grid> {
        if data.len() != height * width {
            return None;
        }
        Some(Grid { height, width, data })
    }

    // ---- Accessors ----

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `(height, width)`, i.e. rows by columns.
    pub fn dims(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.height && col < self.width);
        row * self.width + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[self.index(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        let i = self.index(row, col);
        self.data[i] = value;
    }

    pub fn rows(&self) -> std::slice::Chunks<'_, f64> {
        self.data.chunks(self.width.max(1))
    }

    pub fn is_boundary(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row + 1 == self.height || col + 1 == self.width
    }

    // ---- Bulk operations ----

    /// Sum of squares over every cell, boundary included.
    pub fn sum_of_squares(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum()
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |m, v| m.max(v.abs()))
    }

    pub fn zero_boundary(&mut self) {
        let (h, w) = (self.height, self.width);
        if h == 0 || w == 0 {
            return;
        }
        for col in 0..w {
            self.data[col] = 0.0;
            self.data[(h - 1) * w + col] = 0.0;
        }
        for row in 0..h {
            self.data[row * w] = 0.0;
            self.data[row * w + (w - 1)] = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_row_major() {
        let mut g = Grid::zeros(3, 4);
        g.set(1, 2, 7.0);
        assert_eq!(g.as_slice()[4 + 2], 7.0);
        assert_eq!(g.get(1, 2), 7.0);
        assert_eq!(g.dims(), (3, 4));
    }

    #[test]
    fn sum_of_squares_covers_every_cell() {
        let mut g = Grid::zeros(3, 3);
        g.set(0, 0, 2.0);
        g.set(1, 1, -3.0);
        g.set(2, 2, 1.0);
        assert_eq!(g.sum_of_squares(), 14.0);
    }

    #[test]
    fn zero_boundary_keeps_interior() {
        let mut g = Grid::filled(4, 5, 3.0);
        g.zero_boundary();
        for row in 0..4 {
            for col in 0..5 {
                let expected = if g.is_boundary(row, col) { 0.0 } else { 3.0 };
                assert_eq!(g.get(row, col), expected, "cell ({row}, {col})");
            }
        }
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(Grid::from_vec(2, 2, vec![0.0; 3]).is_none());
        let g = Grid::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let rows: Vec<&[f64]> = g.rows().collect();
        assert_eq!(rows, vec![&[1.0, 2.0, 3.0][..], &[4.0, 5.0, 6.0][..]]);
    }

    #[test]
    fn max_abs_sees_negative_values() {
        let mut g = Grid::zeros(3, 3);
        g.set(1, 1, -13800.0);
        g.set(2, 1, 90.0);
        assert_eq!(g.max_abs(), 13800.0);
    }
}
