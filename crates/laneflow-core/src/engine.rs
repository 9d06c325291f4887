//! The parallel grid-advance pass.
//!
//! # Protocol
//!
//! [`advance`] moves every live vehicle of one road by at most one cell:
//!
//! 1. Clear the `next` buffer. This completes before any claim starts.
//! 2. Process vehicles concurrently, in chunks of [`ADVANCE_CHUNK`]:
//!    - dead vehicles are skipped;
//!    - a vehicle on the terminal cell exits and claims nothing;
//!    - a vehicle whose destination is occupied in `current`, or gated by a
//!      closed signal, stay-claims its own cell;
//!    - otherwise it claims the destination. If a concurrent claimant got
//!      there first it falls back to a stay-claim.
//! 3. After every vehicle is done, swap the buffers.
//!
//! Blocking decisions only read `current` and the frozen [`Gate`], so the
//! resulting occupancy does not depend on how rayon schedules the chunks.
//!
//! Under forward-only single-lane motion at most one vehicle can target a
//! given destination, so the "already claimed" fallback never fires. Any
//! hit is counted in [`PassOutcome::contended`].

use std::ops::Add;

use rayon::prelude::*;

use crate::grid::OccupancyGrid;
use crate::id::VehicleId;
use crate::vehicle::{Population, Vehicle};

/// Vehicles handed to a worker per scheduling unit.
pub const ADVANCE_CHUNK: usize = 64;

// ---------------------------------------------------------------------------
// Gates
// ---------------------------------------------------------------------------

/// Read-only view of the signal state that governs entry into cells.
///
/// Implementations are frozen for the duration of a pass, which is why they
/// must be shareable across worker threads.
pub trait Gate: Sync {
    /// True iff a vehicle may not enter `destination` this tick.
    fn blocks(&self, destination: usize) -> bool;
}

/// A road without signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct Open;

impl Gate for Open {
    fn blocks(&self, _destination: usize) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Tally of one advance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// Vehicles that advanced one cell.
    pub moved: u64,
    /// Vehicles that left the grid from the terminal cell.
    pub exited: u64,
    /// Vehicles that stay-claimed their own cell.
    pub stayed: u64,
    /// Advance attempts that found the destination already claimed.
    pub contended: u64,
}

impl Add for PassOutcome {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            moved: self.moved + rhs.moved,
            exited: self.exited + rhs.exited,
            stayed: self.stayed + rhs.stayed,
            contended: self.contended + rhs.contended,
        }
    }
}

/// What happened to a single vehicle during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Skipped,
    Exited,
    Stayed,
    Moved,
    /// Lost the destination to a concurrent claimant and stayed instead.
    Contended,
}

impl Step {
    fn tally(self) -> PassOutcome {
        let mut out = PassOutcome::default();
        match self {
            Step::Skipped => {}
            Step::Exited => out.exited = 1,
            Step::Stayed => out.stayed = 1,
            Step::Moved => out.moved = 1,
            Step::Contended => {
                out.stayed = 1;
                out.contended = 1;
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Advance
// ---------------------------------------------------------------------------

/// Advance every vehicle of `population` on `grid` by one tick.
///
/// Runs on the ambient rayon pool; call it inside
/// [`ThreadPool::install`](rayon::ThreadPool::install) to pick the worker
/// count. The buffers are swapped before returning.
pub fn advance<G: Gate>(population: &mut Population, grid: &mut OccupancyGrid, gate: &G) -> PassOutcome {
    grid.clear_next();

    let outcome = {
        let grid: &OccupancyGrid = grid;
        population
            .as_mut_slice()
            .par_chunks_mut(ADVANCE_CHUNK)
            .map(|chunk| {
                chunk
                    .iter_mut()
                    .map(|vehicle| advance_vehicle(vehicle, grid, gate).tally())
                    .fold(PassOutcome::default(), Add::add)
            })
            .reduce(PassOutcome::default, Add::add)
    };

    grid.swap();
    outcome
}

fn advance_vehicle<G: Gate>(vehicle: &mut Vehicle, grid: &OccupancyGrid, gate: &G) -> Step {
    if !vehicle.alive {
        return Step::Skipped;
    }
    if vehicle.position >= grid.terminal() {
        vehicle.alive = false;
        return Step::Exited;
    }

    let id: VehicleId = vehicle.id;
    let source = grid.index(vehicle.lane, vehicle.position);
    let next_pos = vehicle.position + 1;
    let destination = grid.index(vehicle.lane, next_pos);

    if grid.occupant_at(destination).is_some() || gate.blocks(next_pos) {
        grid.stay(source, id);
        return Step::Stayed;
    }

    if grid.claim(destination, id) {
        vehicle.position = next_pos;
        Step::Moved
    } else {
        grid.stay(source, id);
        Step::Contended
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{LightBank, LightColor, LightTimings, TrafficLight};

    /// Build a single road with vehicles at the given `(lane, position)` cells.
    fn road(lanes: usize, length: usize, cells: &[(usize, usize)]) -> (Population, OccupancyGrid) {
        let mut pop = Population::new();
        let mut grid = OccupancyGrid::new(lanes, length);
        for &(lane, position) in cells {
            let id = pop.push_at(lane, position);
            assert!(grid.place(lane, position, id));
        }
        (pop, grid)
    }

    fn positions(pop: &Population) -> Vec<Option<usize>> {
        pop.iter()
            .map(|v| v.alive.then_some(v.position))
            .collect()
    }

    /// Gate closed on a fixed set of cells.
    struct Closed(Vec<usize>);

    impl Gate for Closed {
        fn blocks(&self, destination: usize) -> bool {
            self.0.contains(&destination)
        }
    }

    // -----------------------------------------------------------------------
    // Basic motion
    // -----------------------------------------------------------------------

    #[test]
    fn lone_vehicle_drives_off_the_end() {
        let (mut pop, mut grid) = road(1, 5, &[(0, 0)]);
        let mut trail = Vec::new();
        for _ in 0..4 {
            let out = advance(&mut pop, &mut grid, &Open);
            assert_eq!(out.moved, 1);
            trail.push(pop.get(VehicleId(0)).unwrap().position);
        }
        assert_eq!(trail, vec![1, 2, 3, 4]);

        let out = advance(&mut pop, &mut grid, &Open);
        assert_eq!(out.exited, 1);
        assert!(!pop.get(VehicleId(0)).unwrap().alive);
        assert!(grid.lane_occupancy(0).iter().all(Option::is_none));
    }

    #[test]
    fn follower_waits_for_snapshot_gap() {
        // Destinations are judged on the current buffer, so a vehicle
        // directly behind another does not move in the same tick.
        let (mut pop, mut grid) = road(1, 10, &[(0, 2), (0, 3)]);
        let out = advance(&mut pop, &mut grid, &Open);
        assert_eq!(positions(&pop), vec![Some(2), Some(4)]);
        assert_eq!((out.moved, out.stayed), (1, 1));

        advance(&mut pop, &mut grid, &Open);
        assert_eq!(positions(&pop), vec![Some(3), Some(5)]);
    }

    #[test]
    fn terminal_vehicle_exits_before_anything_else() {
        let (mut pop, mut grid) = road(1, 4, &[(0, 2), (0, 3)]);
        let out = advance(&mut pop, &mut grid, &Open);
        // Vehicle 1 exits; vehicle 0 saw cell 3 occupied in current and stays.
        assert_eq!(out.exited, 1);
        assert_eq!(out.stayed, 1);
        assert_eq!(positions(&pop), vec![Some(2), None]);
        assert_eq!(grid.lane_occupancy(0), vec![None, None, Some(VehicleId(0)), None]);
    }

    #[test]
    fn dead_vehicles_are_skipped() {
        let (mut pop, mut grid) = road(1, 5, &[(0, 1)]);
        pop.push_dead();
        let out = advance(&mut pop, &mut grid, &Open);
        assert_eq!(out, PassOutcome { moved: 1, exited: 0, stayed: 0, contended: 0 });
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn lanes_are_independent() {
        let (mut pop, mut grid) = road(3, 6, &[(0, 0), (1, 0), (1, 1), (2, 4)]);
        advance(&mut pop, &mut grid, &Open);
        assert_eq!(positions(&pop), vec![Some(1), Some(0), Some(2), Some(5)]);
    }

    // -----------------------------------------------------------------------
    // Gating
    // -----------------------------------------------------------------------

    #[test]
    fn closed_gate_causes_stay_claim() {
        let (mut pop, mut grid) = road(1, 6, &[(0, 2)]);
        let out = advance(&mut pop, &mut grid, &Closed(vec![3]));
        assert_eq!(out.stayed, 1);
        assert_eq!(grid.occupant(0, 2), Some(VehicleId(0)));

        advance(&mut pop, &mut grid, &Open);
        assert_eq!(grid.occupant(0, 3), Some(VehicleId(0)));
    }

    #[test]
    fn gate_does_not_affect_other_cells() {
        let (mut pop, mut grid) = road(2, 6, &[(0, 0), (1, 3)]);
        advance(&mut pop, &mut grid, &Closed(vec![2]));
        assert_eq!(positions(&pop), vec![Some(1), Some(4)]);
    }

    #[test]
    fn light_snapshot_gates_every_lane() {
        let bank = LightBank::new(
            vec![TrafficLight::new(3, LightTimings::default(), LightColor::Red)],
            6,
        )
        .unwrap();
        let (mut pop, mut grid) = road(2, 6, &[(0, 2), (1, 2)]);
        let out = advance(&mut pop, &mut grid, &bank.snapshot(6));
        assert_eq!(out.stayed, 2);
        assert_eq!(positions(&pop), vec![Some(2), Some(2)]);
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn dense_road_keeps_cells_unique_and_never_contends() {
        let length = 200;
        let cells: Vec<(usize, usize)> = (0..4)
            .flat_map(|lane| (0..length).step_by(2).map(move |p| (lane, p)))
            .collect();
        let (mut pop, mut grid) = road(4, length, &cells);
        for _ in 0..50 {
            let live_before = pop.live_count();
            let out = advance(&mut pop, &mut grid, &Open);
            assert_eq!(out.contended, 0);
            assert_eq!(grid.occupied_count(), pop.live_count());
            assert_eq!(live_before - pop.live_count(), out.exited as usize);
            for v in pop.iter().filter(|v| v.alive) {
                assert_eq!(grid.occupant(v.lane, v.position), Some(v.id));
            }
        }
    }

    #[test]
    fn contended_destination_falls_back_to_stay() {
        // Pre-claim the destination in `next` is impossible through
        // `advance` (it clears first), so drive the per-vehicle step directly.
        let (mut pop, grid) = road(1, 5, &[(0, 1)]);
        grid.clear_next();
        assert!(grid.claim(grid.index(0, 2), VehicleId(99)));
        let vehicle = &mut pop.as_mut_slice()[0];
        let step = advance_vehicle(vehicle, &grid, &Open);
        assert_eq!(step, Step::Contended);
        assert_eq!(vehicle.position, 1);
        assert_eq!(step.tally().stayed, 1);
    }
}
