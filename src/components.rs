use rand::Rng;

/// Stable identity of an organism; also its slot in the population arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrganismId(pub usize);

/// A point organism steering through the scent field.
#[derive(Debug, Clone, PartialEq)]
pub struct Organism {
    pub id: OrganismId,
    /// Degrees, always in [0, 360).
    pub heading: f64,
    // Continuous so organisms can travel at angles other than multiples of
    // 45 degrees while still stepping one cell at a time.
    pub x: f64,
    pub y: f64,
    /// Cell this organism currently occupies.
    pub cell: (usize, usize),
    /// Rounded destination chosen in the intent phase of the current step.
    pub pending: Option<(usize, usize)>,
}

impl Organism {
    pub fn new(id: OrganismId, cell: (usize, usize), heading: f64) -> Self {
        Self {
            id,
            heading: normalize_heading(heading),
            x: cell.0 as f64,
            y: cell.1 as f64,
            cell,
            pending: None,
        }
    }

    /// Turns by `delta` degrees, wrapping back into [0, 360).
    pub fn turn(&mut self, delta: f64) {
        self.heading = normalize_heading(self.heading + delta);
    }
}

/// Dense arena of organisms indexed by `OrganismId`. Removed organisms
/// leave an empty slot so ids held by grid cells never shift.
#[derive(Debug, Clone, Default)]
pub struct Population {
    slots: Vec<Option<Organism>>,
    live: usize,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an organism at `cell`, returning its freshly assigned id.
    pub fn spawn(&mut self, cell: (usize, usize), heading: f64) -> OrganismId {
        let id = OrganismId(self.slots.len());
        self.slots.push(Some(Organism::new(id, cell, heading)));
        self.live += 1;
        id
    }

    pub fn get(&self, id: OrganismId) -> Option<&Organism> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: OrganismId) -> Option<&mut Organism> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Drops an organism permanently. Returns it if it was alive.
    pub fn remove(&mut self, id: OrganismId) -> Option<Organism> {
        let removed = self.slots.get_mut(id.0).and_then(Option::take);
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live organisms in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Organism> {
        self.slots.iter().filter_map(Option::as_ref)
    }
}

/// Wraps any finite angle into [0, 360).
pub fn normalize_heading(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Whole-degree heading drawn uniformly from [0, 360).
pub fn random_heading<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    f64::from(rng.gen_range(0u32..360))
}
