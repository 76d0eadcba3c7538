//! Declarative description of the domain: size, spacing and source cells.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};
use crate::grid::Grid;

/// Physical distance between neighbouring grid points along each axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub hx: f64,
    pub hy: f64,
}

impl Default for Spacing {
    fn default() -> Self {
        Spacing { hx: 1.0, hy: 1.0 }
    }
}

impl Spacing {
    pub fn uniform(h: f64) -> Spacing {
        Spacing { hx: h, hy: h }
    }

    pub fn validate(&self) -> Result<()> {
        let ok = |h: f64| h.is_finite() && h > 0.0;
        if ok(self.hx) && ok(self.hy) {
            Ok(())
        } else {
            Err(SolverError::InvalidSpacing {
                hx: self.hx,
                hy: self.hy,
            })
        }
    }
}

/// One fixed-source record: a forcing value at an interior cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceCell {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

impl SourceCell {
    pub fn new(row: usize, col: usize, value: f64) -> SourceCell {
        SourceCell { row, col, value }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub height: usize,
    pub width: usize,
    #[serde(default)]
    pub spacing: Spacing,
    #[serde(default)]
    pub sources: Vec<SourceCell>,
}

impl Geometry {
    pub fn new(height: usize, width: usize) -> Geometry {
        Geometry {
            height,
            width,
            spacing: Spacing::default(),
            sources: Vec::new(),
        }
    }

    pub fn with_spacing(mut self, spacing: Spacing) -> Geometry {
        self.spacing = spacing;
        self
    }

    pub fn with_source(mut self, row: usize, col: usize, value: f64) -> Geometry {
        self.add_source(row, col, value);
        self
    }

    pub fn add_source(&mut self, row: usize, col: usize, value: f64) {
        self.sources.push(SourceCell::new(row, col, value));
    }

    pub fn is_interior(&self, row: usize, col: usize) -> bool {
        row > 0 && col > 0 && row + 1 < self.height && col + 1 < self.width
    }

    /// Rejects any input the relaxation loop cannot run on.
    pub fn validate(&self) -> Result<()> {
        validate_dims(self.height, self.width)?;
        self.spacing.validate()?;

        for s in &self.sources {
            if !self.is_interior(s.row, s.col) {
                return Err(SolverError::SourceOutsideInterior {
                    row: s.row,
                    col: s.col,
                    height: self.height,
                    width: self.width,
                });
            }
            if !s.value.is_finite() {
                return Err(SolverError::InvalidSourceValue {
                    row: s.row,
                    col: s.col,
                    value: s.value,
                });
            }
        }
        Ok(())
    }

    /// Builds the source field. Records naming the same cell twice are
    /// applied in order, so the later value wins.
    pub fn source_field(&self) -> Result<Grid> {
        self.validate()?;

        let mut field = Grid::zeros(self.height, self.width);
        let mut seen = HashSet::with_capacity(self.sources.len());
        let mut duplicates = 0usize;
        for s in &self.sources {
            if !seen.insert((s.row, s.col)) {
                duplicates += 1;
            }
            field.set(s.row, s.col, s.value);
        }
        if duplicates > 0 {
            log::warn!("{duplicates} source record(s) overwrite an earlier source at the same cell");
        }
        Ok(field)
    }
}

pub(crate) fn validate_dims(height: usize, width: usize) -> Result<()> {
    if height < 3 || width < 3 {
        return Err(SolverError::InvalidDimensions { height, width });
    }
    Ok(())
}
