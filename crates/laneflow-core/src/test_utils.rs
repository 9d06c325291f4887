//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::engine::{Gate, PassOutcome};
use crate::grid::OccupancyGrid;
use crate::id::VehicleId;
use crate::vehicle::Population;

// ===========================================================================
// Road builders
// ===========================================================================

/// Build a road with one vehicle per listed `(lane, position)` cell.
///
/// Panics if two vehicles share a cell.
pub fn road(lanes: usize, length: usize, cells: &[(usize, usize)]) -> (Population, OccupancyGrid) {
    let mut population = Population::with_capacity(cells.len());
    let mut grid = OccupancyGrid::new(lanes, length);
    for &(lane, position) in cells {
        let id = population.push_at(lane, position);
        assert!(
            grid.place(lane, position, id),
            "cell ({lane}, {position}) listed twice"
        );
    }
    (population, grid)
}

/// A road where every `gap`-th cell of every lane holds a vehicle.
pub fn striped_road(lanes: usize, length: usize, gap: usize) -> (Population, OccupancyGrid) {
    let cells: Vec<(usize, usize)> = (0..lanes)
        .flat_map(|lane| (0..length).step_by(gap.max(1)).map(move |p| (lane, p)))
        .collect();
    road(lanes, length, &cells)
}

// ===========================================================================
// Inspection
// ===========================================================================

/// Position of every vehicle, `None` once it has exited.
pub fn positions(population: &Population) -> Vec<Option<usize>> {
    population
        .iter()
        .map(|v| v.alive.then_some(v.position))
        .collect()
}

/// Occupied/empty pattern of the grid's `current` buffer.
pub fn occupancy_pattern(grid: &OccupancyGrid) -> Vec<bool> {
    grid.snapshot().iter().map(Option::is_some).collect()
}

/// Check that grid and population agree: every live vehicle sits in its own
/// recorded cell and no cell holds anything else.
pub fn assert_consistent(population: &Population, grid: &OccupancyGrid) {
    let mut expected: Vec<Option<VehicleId>> = vec![None; grid.cell_count()];
    for v in population.iter().filter(|v| v.alive) {
        let index = grid.index(v.lane, v.position);
        assert!(
            expected[index].is_none(),
            "vehicles {:?} and {:?} share cell ({}, {})",
            expected[index],
            v.id,
            v.lane,
            v.position
        );
        expected[index] = Some(v.id);
    }
    assert_eq!(grid.snapshot(), expected, "grid disagrees with population");
}

// ===========================================================================
// Reference stepper
// ===========================================================================

/// Single-threaded reference for [`crate::engine::advance`].
///
/// Same rules, plain loop, no locks: the destination check reads the
/// pre-tick occupancy and the new occupancy is built in a fresh table.
pub fn advance_serial<G: Gate>(
    population: &mut Population,
    grid: &mut OccupancyGrid,
    gate: &G,
) -> PassOutcome {
    let lanes = grid.lanes();
    let length = grid.length();
    let mut next = OccupancyGrid::new(lanes, length);
    let mut outcome = PassOutcome::default();

    for vehicle in population.as_mut_slice() {
        if !vehicle.alive {
            continue;
        }
        if vehicle.position == length - 1 {
            vehicle.alive = false;
            outcome.exited += 1;
            continue;
        }
        let next_pos = vehicle.position + 1;
        if grid.occupant(vehicle.lane, next_pos).is_none() && !gate.blocks(next_pos) {
            vehicle.position = next_pos;
            outcome.moved += 1;
        } else {
            outcome.stayed += 1;
        }
        next.place(vehicle.lane, vehicle.position, vehicle.id);
    }

    *grid = next;
    outcome
}
