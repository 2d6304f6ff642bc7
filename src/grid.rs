use std::ops::Range;

use rand::Rng;

use crate::components::{random_heading, OrganismId, Population};
use crate::error::{Result, SimError};

/// Largest grid, in cells, that will be allocated.
pub const MAX_CELLS: usize = 1 << 24;

/// One lattice site: a scent intensity and at most one resident organism.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cell {
    pub scent: f64,
    pub occupant: Option<OrganismId>,
}

/// The 2D lattice. Single source of truth for spatial occupancy.
///
/// Cells are stored row-major; `(x, y)` addresses column `x` of row `y`.
#[derive(Debug, Clone)]
pub struct FieldGrid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FieldGrid {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let len = cell_count(width, height).ok_or(SimError::InvalidDimensions { width, height })?;
        Ok(Self {
            width,
            height,
            cells: vec![Cell::default(); len],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Admissible destinations exclude the outer ring: `0 < x < width`
    /// and `0 < y < height`.
    pub fn has_coord(&self, x: i64, y: i64) -> bool {
        x > 0 && x < self.width as i64 && y > 0 && y < self.height as i64
    }

    /// The cell at `(x, y)` as unsigned coordinates, if admissible.
    pub fn admissible(&self, x: i64, y: i64) -> Option<(usize, usize)> {
        self.has_coord(x, y).then(|| (x as usize, y as usize))
    }

    /// Row-major position of a cell in [`FieldGrid::cells`].
    #[inline]
    pub fn index(&self, (x, y): (usize, usize)) -> usize {
        y * self.width + x
    }

    pub fn get(&self, pos: (usize, usize)) -> &Cell {
        &self.cells[self.index(pos)]
    }

    pub fn get_mut(&mut self, pos: (usize, usize)) -> &mut Cell {
        let idx = self.index(pos);
        &mut self.cells[idx]
    }

    pub fn scent(&self, pos: (usize, usize)) -> f64 {
        self.get(pos).scent
    }

    pub fn occupant(&self, pos: (usize, usize)) -> Option<OrganismId> {
        self.get(pos).occupant
    }

    pub fn deposit(&mut self, pos: (usize, usize), amount: f64) {
        self.get_mut(pos).scent += amount;
    }

    /// Multiplies the scent of the cells in a row-major index range by
    /// `factor`. Ranges past the end are cut short.
    pub fn decay_span(&mut self, span: Range<usize>, factor: f64) {
        let end = span.end.min(self.cells.len());
        let start = span.start.min(end);
        for cell in &mut self.cells[start..end] {
            cell.scent *= factor;
        }
    }

    pub fn place(&mut self, pos: (usize, usize), id: OrganismId) {
        self.get_mut(pos).occupant = Some(id);
    }

    pub fn vacate(&mut self, pos: (usize, usize)) {
        self.get_mut(pos).occupant = None;
    }

    /// Cells in row-major order: top to bottom, left to right.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Occupants in row-major order of the cells they occupy. This is the
    /// processing order of every step phase.
    pub fn occupants(&self) -> Vec<OrganismId> {
        self.cells.iter().filter_map(|cell| cell.occupant).collect()
    }

    /// Seeds each cell independently with probability `chance`, giving each
    /// new organism a random whole-degree heading.
    pub fn populate<R: Rng + ?Sized>(
        &mut self,
        population: &mut Population,
        chance: f64,
        rng: &mut R,
    ) {
        let chance = chance.clamp(0.0, 1.0);
        for y in 0..self.height {
            for x in 0..self.width {
                if rng.gen_bool(chance) {
                    let heading = random_heading(rng);
                    let id = population.spawn((x, y), heading);
                    self.place((x, y), id);
                }
            }
        }
    }
}

/// Number of cells in a `width` x `height` grid, if it is non-empty and
/// within [`MAX_CELLS`].
pub fn cell_count(width: usize, height: usize) -> Option<usize> {
    width
        .checked_mul(height)
        .filter(|&len| len > 0 && len <= MAX_CELLS)
}
