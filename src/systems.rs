//! The phases of one simulation step.
//!
//! Every phase walks organisms in the same order: row-major over the cells
//! they occupied when the step began. Movement is resolved greedily in that
//! order, so organisms nearer the top-left win contested cells. That bias is
//! part of the model's behaviour.
//!
//! Decay rides along with the movement walk: each cell decays when the walk
//! reaches it, before its occupant moves. A deposit on a cell the walk has
//! already passed survives the step at full strength; a deposit ahead of the
//! walk decays once before the frame is drawn.

use rand::Rng;

use crate::components::{random_heading, Organism, OrganismId, Population};
use crate::geometry::{next_position, to_grid_position, Velocity};
use crate::grid::FieldGrid;

/// Organisms advance one cell-length per step.
pub const STEP_SPEED: f64 = 1.0;

/// Counters describing what happened during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub removed: usize,
    pub moved: usize,
    pub collisions: usize,
    pub lost_bearing: usize,
}

/// Intent phase: advance each organism's continuous position and record the
/// rounded destination. Organisms whose destination leaves the admissible
/// area are removed and their cell vacated.
pub fn intent_system(
    grid: &mut FieldGrid,
    population: &mut Population,
    order: &[OrganismId],
) -> usize {
    let mut removed = 0;

    for &id in order {
        let Some(organism) = population.get_mut(id) else {
            continue;
        };

        let velocity = Velocity::new(organism.heading, STEP_SPEED);
        let (next_x, next_y) = next_position(organism.x, organism.y, velocity);
        let (cell_x, cell_y) = to_grid_position(next_x, next_y);

        // The continuous position advances even if the move is later blocked.
        organism.x = next_x;
        organism.y = next_y;
        organism.pending = grid.admissible(cell_x, cell_y);

        if organism.pending.is_none() {
            let source = organism.cell;
            grid.vacate(source);
            population.remove(id);
            removed += 1;
            log::trace!("organism {} fell off at ({cell_x}, {cell_y})", id.0);
        }
    }

    removed
}

/// Movement phase: claim destinations against the partially updated grid,
/// decaying every cell exactly once along the way. Returns
/// `(moved, collisions)`.
pub fn movement_system<R: Rng + ?Sized>(
    grid: &mut FieldGrid,
    population: &mut Population,
    rng: &mut R,
    deposit: f64,
    decay: f64,
    order: &[OrganismId],
) -> (usize, usize) {
    let mut moved = 0;
    let mut collisions = 0;
    // Row-major index of the first cell not yet decayed this step
    let mut cursor = 0;

    for &id in order {
        let Some(organism) = population.get_mut(id) else {
            continue;
        };

        // Sources are strictly increasing: `order` is row-major and nobody
        // moves before their own turn.
        let source = grid.index(organism.cell);
        grid.decay_span(cursor..source + 1, decay);
        cursor = source + 1;

        let Some(destination) = organism.pending else {
            continue;
        };

        match grid.occupant(destination) {
            None => {
                grid.vacate(organism.cell);
                grid.place(destination, id);
                grid.deposit(destination, deposit);
                organism.cell = destination;
                moved += 1;
            }
            Some(other) if other != id => {
                organism.heading = random_heading(rng);
                collisions += 1;
                log::trace!(
                    "organism {} blocked by {} at {:?}, new heading {}",
                    id.0,
                    other.0,
                    destination,
                    organism.heading
                );
            }
            // Destination rounds back to its own cell
            Some(_) => {}
        }
    }
    grid.decay_span(cursor..grid.cells().len(), decay);

    (moved, collisions)
}

/// Scent measured by the three probes of one organism.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub front: f64,
    pub left: f64,
    pub right: f64,
}

/// Turn decided from a sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steer {
    Ahead,
    Left,
    Right,
    /// Both sides beat the front; pick a side at random.
    Either,
}

impl SensorReading {
    pub fn judge(&self) -> Steer {
        let SensorReading { front, left, right } = *self;
        if front > left && front > right {
            Steer::Ahead
        } else if left > front && right > front {
            Steer::Either
        } else if left > front && left > right {
            Steer::Left
        } else if right > front && right > left {
            Steer::Right
        } else {
            Steer::Ahead
        }
    }
}

/// Reads the three probes cast `distance` cells from the organism at
/// heading, heading + `degree` and heading - `degree`. `None` if any probe
/// lands outside the admissible area.
pub fn sense(
    grid: &FieldGrid,
    organism: &Organism,
    degree: f64,
    distance: f64,
) -> Option<SensorReading> {
    let probe = |direction: f64| {
        let (x, y) = next_position(organism.x, organism.y, Velocity::new(direction, distance));
        let (cell_x, cell_y) = to_grid_position(x, y);
        grid.admissible(cell_x, cell_y).map(|cell| grid.scent(cell))
    };

    Some(SensorReading {
        front: probe(organism.heading)?,
        left: probe(organism.heading + degree)?,
        right: probe(organism.heading - degree)?,
    })
}

/// Sensing phase: turn each surviving organism toward the strongest scent.
/// Returns how many organisms lost their bearing at the edge.
pub fn sensing_system<R: Rng + ?Sized>(
    grid: &FieldGrid,
    population: &mut Population,
    rng: &mut R,
    degree: f64,
    distance: f64,
    order: &[OrganismId],
) -> usize {
    let mut lost = 0;

    for &id in order {
        let Some(organism) = population.get_mut(id) else {
            continue;
        };

        let Some(reading) = sense(grid, organism, degree, distance) else {
            organism.heading = random_heading(rng);
            lost += 1;
            continue;
        };

        match reading.judge() {
            Steer::Ahead => {}
            Steer::Left => organism.turn(degree),
            Steer::Right => organism.turn(-degree),
            Steer::Either => {
                if rng.gen_bool(0.5) {
                    organism.turn(degree);
                } else {
                    organism.turn(-degree);
                }
            }
        }
    }

    lost
}

/// Runs one full step: intent, movement with decay, sensing.
pub fn step<R: Rng + ?Sized>(
    grid: &mut FieldGrid,
    population: &mut Population,
    rng: &mut R,
    params: &StepParams,
) -> StepReport {
    let order = grid.occupants();

    let removed = intent_system(grid, population, &order);
    let (moved, collisions) = movement_system(
        grid,
        population,
        rng,
        params.deposit,
        params.decay,
        &order,
    );
    let lost_bearing = sensing_system(
        grid,
        population,
        rng,
        params.sensor_degree,
        params.sensor_distance,
        &order,
    );

    StepReport {
        removed,
        moved,
        collisions,
        lost_bearing,
    }
}

/// Per-step constants, resolved once from the run configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    pub deposit: f64,
    pub decay: f64,
    pub sensor_degree: f64,
    pub sensor_distance: f64,
}
