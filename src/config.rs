use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::grid::cell_count;

/// Parameters of one simulation run. Passed by value into the engine;
/// nothing here is global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
    pub width: usize,
    pub height: usize,
    pub n_frames: usize,

    // Animation output
    pub loop_count: u16,
    /// Per-frame display time in hundredths of a second.
    pub delay: u16,

    // Sensing
    pub sensor_degree: i64,
    pub sensor_distance: i64,

    // Scent field
    pub scent_decay: f64,
    pub scent_deposit: f64,
    /// Carried through from parameters; scent does not diffuse.
    pub scent_spread_factor: i64,

    /// Probability that a cell starts with an organism.
    pub spawn_chance: f64,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            n_frames: 500,
            loop_count: 1000,
            delay: 2,
            sensor_degree: 45,
            sensor_distance: 9,
            scent_decay: 0.9,
            scent_deposit: 1.0,
            scent_spread_factor: 0,
            spawn_chance: 0.1,
            seed: None,
        }
    }
}

/// Most classified pixels a run may hold in memory: frames times cells.
pub const MAX_FRAME_PIXELS: usize = 1 << 30;

/// Integer parameters accepted from a query string or `--set`.
pub const PARAM_NAMES: [&str; 9] = [
    "width",
    "height",
    "nFrames",
    "loopCount",
    "delay",
    "sensorDegree",
    "sensorDistance",
    "scentSpreadFactor",
    "seed",
];

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SimError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overrides fields from named string values. Values that do not parse
    /// as integers of the right range are skipped and the current value kept.
    /// So are sizes that would leave the grid empty or exceed [`MAX_CELLS`],
    /// and frame counts that would exceed [`MAX_FRAME_PIXELS`].
    ///
    /// [`MAX_CELLS`]: crate::grid::MAX_CELLS
    pub fn apply_params(&mut self, params: &HashMap<String, String>) {
        let (width, height, n_frames) = (self.width, self.height, self.n_frames);

        for name in PARAM_NAMES {
            let Some(raw) = params.get(name) else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }
            if !self.set_param(name, raw.trim()) {
                log::warn!("ignoring {name}={raw:?}: not a valid integer");
            }
        }

        if cell_count(self.width, self.height).is_none() {
            log::warn!(
                "ignoring size {}x{}: grid would be empty or too large",
                self.width,
                self.height
            );
            self.width = width;
            self.height = height;
        }
        if self.frame_pixels().is_none() {
            log::warn!("ignoring nFrames={}: too many frames for this grid", self.n_frames);
            self.n_frames = n_frames;
        }
    }

    /// Pixels across all frames of a run, if within [`MAX_FRAME_PIXELS`].
    pub fn frame_pixels(&self) -> Option<usize> {
        cell_count(self.width, self.height)?
            .checked_mul(self.n_frames)
            .filter(|&total| total <= MAX_FRAME_PIXELS)
    }

    fn set_param(&mut self, name: &str, raw: &str) -> bool {
        fn parse<T: std::str::FromStr>(raw: &str, slot: &mut T) -> bool {
            match raw.parse() {
                Ok(value) => {
                    *slot = value;
                    true
                }
                Err(_) => false,
            }
        }

        match name {
            "width" => parse(raw, &mut self.width),
            "height" => parse(raw, &mut self.height),
            "nFrames" => parse(raw, &mut self.n_frames),
            "loopCount" => parse(raw, &mut self.loop_count),
            "delay" => parse(raw, &mut self.delay),
            "sensorDegree" => parse(raw, &mut self.sensor_degree),
            "sensorDistance" => parse(raw, &mut self.sensor_distance),
            "scentSpreadFactor" => parse(raw, &mut self.scent_spread_factor),
            "seed" => {
                let mut seed = 0u64;
                let ok = parse(raw, &mut seed);
                if ok {
                    self.seed = Some(seed);
                }
                ok
            }
            _ => false,
        }
    }

    /// Fixes the seed, drawing one from entropy if none was given, so the
    /// run can be named and repeated.
    pub fn with_resolved_seed(mut self) -> Self {
        self.seed.get_or_insert_with(rand::random);
        self
    }

    /// Artifact file name encoding the parameters that shape the animation.
    /// Configs that differ only in an unset seed share a name; resolve the
    /// seed first when names must be unique per run.
    pub fn artifact_name(&self) -> String {
        let seed = self
            .seed
            .map_or_else(|| "random".to_string(), |seed| seed.to_string());
        format!(
            "w{}h{}nF{}d{}lc{}sDe{}sDi{}s{}.gif",
            self.width,
            self.height,
            self.n_frames,
            self.delay,
            self.loop_count,
            self.sensor_degree,
            self.sensor_distance,
            seed
        )
    }
}
