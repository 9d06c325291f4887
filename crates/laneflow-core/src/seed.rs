//! Reproducible scenario seeding.
//!
//! Vehicles are placed one at a time by rejection sampling: draw a random
//! `(lane, position)` and keep it if the cell is free. A vehicle that finds
//! no free cell within `10 * length` draws is seeded dead-on-arrival. It
//! keeps its id and is counted, but never takes part in a tick.

use tracing::{info, warn};

use crate::grid::OccupancyGrid;
use crate::rng::SimRng;
use crate::vehicle::Population;

/// Draws allowed per vehicle, as a multiple of the segment length.
pub const ATTEMPTS_PER_CELL: usize = 10;

/// Result of seeding one road.
#[derive(Debug)]
pub struct Seeded {
    pub population: Population,
    pub grid: OccupancyGrid,
    /// Vehicles that could not be placed.
    pub dead_on_arrival: usize,
}

/// Place `count` vehicles on an empty `lanes x length` road.
pub fn seed(count: usize, lanes: usize, length: usize, seed: u64) -> Seeded {
    let mut rng = SimRng::new(seed);
    let mut grid = OccupancyGrid::new(lanes, length);
    let mut population = Population::with_capacity(count);
    let max_attempts = ATTEMPTS_PER_CELL * length;
    let mut dead_on_arrival = 0;

    for _ in 0..count {
        let mut placed = None;
        for _ in 0..max_attempts {
            let lane = rng.below(lanes);
            let position = rng.below(length);
            if grid.occupant(lane, position).is_none() {
                placed = Some((lane, position));
                break;
            }
        }
        match placed {
            Some((lane, position)) => {
                let id = population.push_at(lane, position);
                grid.place(lane, position, id);
            }
            None => {
                population.push_dead();
                dead_on_arrival += 1;
            }
        }
    }

    if dead_on_arrival > 0 {
        warn!(
            dead_on_arrival,
            count, "seeding exhausted its attempts for some vehicles"
        );
    }
    info!(
        placed = count - dead_on_arrival,
        lanes, length, seed, "seeded road"
    );

    Seeded {
        population,
        grid,
        dead_on_arrival,
    }
}
