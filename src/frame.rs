use crate::colors::Palette;
use crate::grid::FieldGrid;

/// What a single pixel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Empty,
    /// Scent bucket, already clamped.
    Scented(u8),
    Occupied,
}

/// One rendered step: palette indices in row-major order plus the time the
/// frame stays on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    /// Hundredths of a second.
    delay: u16,
    pixels: Vec<u8>,
}

impl Frame {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn delay(&self) -> u16 {
        self.delay
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks(self.width)
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }
}

/// Read-only pass turning the grid into palette indices.
pub fn classify(grid: &FieldGrid, palette: &Palette, delay: u16) -> Frame {
    let pixels = grid
        .cells()
        .iter()
        .map(|cell| palette.index_of(palette.classify(cell.occupant.is_some(), cell.scent)))
        .collect();

    Frame {
        width: grid.width(),
        height: grid.height(),
        delay,
        pixels,
    }
}
