//! Slime mold simulation: point organisms wander a grid, lay scent where
//! they step and steer toward the strongest scent ahead of them.
//!
//! [`run`] is the core entry point. The rest of the crate adapts it to
//! animated GIFs, PNG sequences, an HTTP endpoint and a live window.

pub mod colors;
pub mod components;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod grid;
pub mod server;
pub mod simulation;
pub mod systems;
pub mod video;
pub mod viewer;

pub use colors::Palette;
pub use components::{Organism, OrganismId, Population};
pub use config::SimConfig;
pub use error::{Result, SimError};
pub use frame::{Classification, Frame};
pub use grid::{Cell, FieldGrid};
pub use simulation::{run, Simulation};
pub use systems::StepReport;

/// Runs a simulation and encodes it as an animated GIF in memory.
pub fn render_gif(config: &SimConfig) -> Result<Vec<u8>> {
    let frames = run(config.clone())?;
    let mut bytes = Vec::new();
    video::encode_gif(&mut bytes, &frames, config.loop_count, &Palette::default())?;
    Ok(bytes)
}
