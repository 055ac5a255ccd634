//! Triangular peg lattice
//!
//! Row `r` (0..=rows) holds `r + 1` pegs centred on the board, so the lattice
//! has `(rows + 1)(rows + 2) / 2` pegs. Pegs are stored row-major, which lets
//! collision look up just the rows around a ball.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::BoardConfig;

/// A static peg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peg {
    pub row: u32,
    pub col: u32,
    pub pos: Vec2,
}

impl Peg {
    /// Position of the peg at `(row, col)`
    pub fn at(row: u32, col: u32, config: &BoardConfig) -> Self {
        let x = config.center_x() + (col as f32 - row as f32 / 2.0) * config.peg_spacing_x;
        let y = config.row_y(row);
        Self {
            row,
            col,
            pos: Vec2::new(x, y),
        }
    }
}

/// Generate every peg for a board, row-major
pub fn generate(config: &BoardConfig) -> Vec<Peg> {
    (0..=config.rows)
        .flat_map(|row| (0..=row).map(move |col| Peg::at(row, col, config)))
        .collect()
}

/// Index of the first peg of `row` in row-major order
#[inline]
fn row_start(row: u32) -> usize {
    (row as usize * (row as usize + 1)) / 2
}

/// Cached lattice for one board configuration
#[derive(Debug, Clone)]
pub struct PegLattice {
    pegs: Vec<Peg>,
    rows: u32,
    drop_zone_height: f32,
    peg_spacing_y: f32,
    /// Ball-peg contact distance, padded so rounding never drops a touching row
    reach: f32,
}

impl PegLattice {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            pegs: generate(config),
            rows: config.rows,
            drop_zone_height: config.drop_zone_height,
            peg_spacing_y: config.peg_spacing_y,
            reach: config.ball_radius + config.peg_radius + 1e-3,
        }
    }

    pub fn pegs(&self) -> &[Peg] {
        &self.pegs
    }

    pub fn len(&self) -> usize {
        self.pegs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pegs.is_empty()
    }

    /// Pegs of a single row
    pub fn row(&self, row: u32) -> &[Peg] {
        if row > self.rows {
            return &[];
        }
        &self.pegs[row_start(row)..row_start(row + 1)]
    }

    /// Pegs in every row within contact distance of a ball centred at `y`
    ///
    /// Empty between rows when the contact distance is under half a row
    /// spacing. Spans several rows when it is larger than one.
    pub fn rows_near(&self, y: f32) -> &[Peg] {
        let offset = y - self.drop_zone_height;
        let first = ((offset - self.reach) / self.peg_spacing_y).ceil();
        let last = ((offset + self.reach) / self.peg_spacing_y).floor();
        if last < 0.0 || first > self.rows as f32 || first > last {
            return &[];
        }
        let first = first.max(0.0) as u32;
        let last = last.min(self.rows as f32) as u32;
        &self.pegs[row_start(first)..row_start(last + 1)]
    }
}
