use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::colors::Palette;
use crate::components::{OrganismId, Population};
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::frame::{classify, Frame};
use crate::grid::{cell_count, FieldGrid};
use crate::systems::{self, StepParams, StepReport};

/// One run: owns its grid, population and random generator exclusively.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    params: StepParams,
    palette: Palette,
    grid: FieldGrid,
    population: Population,
    rng: ChaCha8Rng,
    seed: u64,
    steps: u64,
}

impl Simulation {
    /// Builds a grid seeded with a random population.
    pub fn new(config: SimConfig) -> Result<Self> {
        let mut sim = Self::empty(config)?;
        sim.grid
            .populate(&mut sim.population, sim.config.spawn_chance, &mut sim.rng);

        log::info!(
            "seeded {}x{} grid with {} organisms (seed {})",
            sim.grid.width(),
            sim.grid.height(),
            sim.population.len(),
            sim.seed
        );
        Ok(sim)
    }

    /// Builds a grid with no organisms; add them with [`Simulation::spawn`].
    pub fn empty(config: SimConfig) -> Result<Self> {
        let grid = FieldGrid::new(config.width, config.height)?;
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let params = StepParams {
            deposit: config.scent_deposit,
            decay: config.scent_decay,
            sensor_degree: config.sensor_degree as f64,
            sensor_distance: config.sensor_distance as f64,
        };

        Ok(Self {
            config,
            params,
            palette: Palette::default(),
            grid,
            population: Population::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            steps: 0,
        })
    }

    /// Places an organism on a free cell inside the grid.
    pub fn spawn(&mut self, cell: (usize, usize), heading: f64) -> Option<OrganismId> {
        let (x, y) = cell;
        if x >= self.grid.width() || y >= self.grid.height() || self.grid.occupant(cell).is_some() {
            return None;
        }
        let id = self.population.spawn(cell, heading);
        self.grid.place(cell, id);
        Some(id)
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn step(&mut self) -> StepReport {
        let report = systems::step(
            &mut self.grid,
            &mut self.population,
            &mut self.rng,
            &self.params,
        );
        self.steps += 1;

        log::debug!(
            "step {}: {} alive, {} moved, {} removed, {} collisions, {} lost bearing",
            self.steps,
            self.population.len(),
            report.moved,
            report.removed,
            report.collisions,
            report.lost_bearing
        );
        report
    }

    /// Classifies the current grid into a frame.
    pub fn frame(&self) -> Frame {
        classify(&self.grid, &self.palette, self.config.delay)
    }

    /// Steps once and returns the resulting frame.
    pub fn next_frame(&mut self) -> Frame {
        self.step();
        self.frame()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn grid(&self) -> &FieldGrid {
        &self.grid
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

/// Runs a fresh simulation for `n_frames` steps, one frame per step.
pub fn run(config: SimConfig) -> Result<Vec<Frame>> {
    let n_frames = config.n_frames;
    if cell_count(config.width, config.height).is_some() && config.frame_pixels().is_none() {
        return Err(SimError::TooManyFrames {
            n_frames,
            width: config.width,
            height: config.height,
        });
    }
    let mut sim = Simulation::new(config)?;
    let frames = (0..n_frames).map(|_| sim.next_frame()).collect();
    log::info!(
        "rendered {} frames, {} organisms remain",
        n_frames,
        sim.population().len()
    );
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(seed: u64) -> SimConfig {
        SimConfig {
            width: 40,
            height: 30,
            n_frames: 12,
            seed: Some(seed),
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_run_frame_count_and_shape() {
        let frames = run(small_config(5)).unwrap();
        assert_eq!(frames.len(), 12);
        for frame in &frames {
            assert_eq!((frame.width(), frame.height()), (40, 30));
            assert_eq!(frame.delay(), 2);
        }
    }

    #[test]
    fn test_zero_frames() {
        let config = SimConfig {
            n_frames: 0,
            ..small_config(1)
        };
        assert!(run(config).unwrap().is_empty());
    }

    #[test]
    fn test_seed_is_reported() {
        let sim = Simulation::new(small_config(77)).unwrap();
        assert_eq!(sim.seed(), 77);
        assert_eq!(sim.steps(), 0);
    }

    #[test]
    fn test_spawn_rejects_taken_and_outside_cells() {
        let mut sim = Simulation::empty(small_config(1)).unwrap();
        assert!(sim.spawn((3, 3), 0.0).is_some());
        assert!(sim.spawn((3, 3), 90.0).is_none());
        assert!(sim.spawn((40, 3), 0.0).is_none());
        assert_eq!(sim.population().len(), 1);
    }

    #[test]
    fn test_invalid_dimensions() {
        let config = SimConfig {
            width: 0,
            ..small_config(1)
        };
        assert!(matches!(
            Simulation::new(config),
            Err(SimError::InvalidDimensions { width: 0, height: 30 })
        ));

        let config = SimConfig {
            width: 1 << 33,
            height: 1 << 31,
            ..small_config(1)
        };
        assert!(matches!(run(config), Err(SimError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_too_many_frames_is_refused() {
        let config = SimConfig {
            n_frames: usize::MAX,
            ..small_config(1)
        };
        assert!(matches!(run(config), Err(SimError::TooManyFrames { .. })));
    }
}
