use crate::frame::{Classification, Frame};

/// Greyscale palette and the scent bucketing that indexes into it.
///
/// Index 0 is black; indices 1..=26 are grey levels 0, 10, ..., 250.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    /// Index used for any cell with an organism.
    pub occupied_index: u8,
    /// Scent at or below this is drawn as empty.
    pub scent_floor: f64,
    /// Scent is multiplied by this and truncated to get its index.
    pub scent_scale: f64,
    /// Highest index a scented cell can reach.
    pub max_scent_index: u8,
    colors: Vec<[u8; 3]>,
}

impl Default for Palette {
    fn default() -> Self {
        let mut colors = vec![[0, 0, 0]];
        colors.extend((0..=250u8).step_by(10).map(|grey| [grey, grey, grey]));

        Self {
            occupied_index: 26,
            scent_floor: 0.01,
            scent_scale: 100.0,
            max_scent_index: 26,
            colors,
        }
    }
}

impl Palette {
    pub fn rgb(&self, index: u8) -> [u8; 3] {
        self.colors
            .get(usize::from(index))
            .copied()
            .unwrap_or([0, 0, 0])
    }

    /// Bucket for a cell, occupancy taking priority over scent.
    pub fn classify(&self, occupied: bool, scent: f64) -> Classification {
        if occupied {
            Classification::Occupied
        } else if scent > self.scent_floor {
            let bucket = (scent * self.scent_scale).min(f64::from(self.max_scent_index));
            Classification::Scented(bucket as u8)
        } else {
            Classification::Empty
        }
    }

    pub fn index_of(&self, classification: Classification) -> u8 {
        match classification {
            Classification::Empty => 0,
            Classification::Scented(level) => level,
            Classification::Occupied => self.occupied_index,
        }
    }

    /// Expands a frame of palette indices into opaque RGBA bytes.
    pub fn to_rgba(&self, frame: &Frame) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(frame.pixels().len() * 4);
        for &index in frame.rows().flatten() {
            let [r, g, b] = self.rgb(index);
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
        rgba
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_layout() {
        let palette = Palette::default();
        assert_eq!(palette.colors.len(), 27);
        assert_eq!(palette.rgb(0), [0, 0, 0]);
        assert_eq!(palette.rgb(1), [0, 0, 0]);
        assert_eq!(palette.rgb(2), [10, 10, 10]);
        assert_eq!(palette.rgb(palette.occupied_index), [250, 250, 250]);
        assert_eq!(palette.rgb(200), [0, 0, 0]);
    }

    #[test]
    fn test_classify_buckets() {
        let palette = Palette::default();
        assert_eq!(palette.classify(true, 0.0), Classification::Occupied);
        assert_eq!(palette.classify(true, 9.0), Classification::Occupied);
        assert_eq!(palette.classify(false, 0.0), Classification::Empty);
        assert_eq!(palette.classify(false, 0.01), Classification::Empty);
        assert_eq!(palette.classify(false, 0.05), Classification::Scented(5));
        assert_eq!(palette.classify(false, 0.2), Classification::Scented(20));
        assert_eq!(palette.classify(false, 0.9), Classification::Scented(26));
        assert_eq!(palette.classify(false, 1e6), Classification::Scented(26));
    }

    #[test]
    fn test_to_rgba_is_row_major() {
        use crate::components::OrganismId;
        use crate::frame::classify;
        use crate::grid::FieldGrid;

        let mut grid = FieldGrid::new(3, 2).unwrap();
        grid.place((2, 0), OrganismId(0));
        grid.deposit((0, 1), 0.02);
        let palette = Palette::default();

        let rgba = palette.to_rgba(&classify(&grid, &palette, 2));

        assert_eq!(rgba.len(), 3 * 2 * 4);
        assert_eq!(&rgba[8..12], &[250, 250, 250, 255]);
        assert_eq!(&rgba[12..16], &[10, 10, 10, 255]);
        assert!(rgba.chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_index_of() {
        let palette = Palette::default();
        assert_eq!(palette.index_of(Classification::Empty), 0);
        assert_eq!(palette.index_of(Classification::Scented(7)), 7);
        assert_eq!(palette.index_of(Classification::Occupied), 26);
    }
}
