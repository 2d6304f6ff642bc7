/// Heading (degrees) and step length of a moving point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub direction: f64,
    pub speed: f64,
}

impl Velocity {
    pub fn new(direction: f64, speed: f64) -> Self {
        Self { direction, speed }
    }

    /// Per-axis displacement for one step at this velocity.
    pub fn linear(&self) -> (f64, f64) {
        linear_velocity(self.direction, self.speed)
    }
}

pub fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

pub fn linear_velocity(direction: f64, speed: f64) -> (f64, f64) {
    let radians = to_radians(direction);
    (speed * radians.cos(), speed * radians.sin())
}

/// Next theoretical (unrounded) position after one step.
pub fn next_position(x: f64, y: f64, velocity: Velocity) -> (f64, f64) {
    let (dx, dy) = velocity.linear();
    (x + dx, y + dy)
}

/// Rounds a continuous position to its grid cell. Halves round away from zero.
pub fn to_grid_position(x: f64, y: f64) -> (i64, i64) {
    (x.round() as i64, y.round() as i64)
}
