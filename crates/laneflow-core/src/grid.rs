//! Double-buffered occupancy grid for one road segment.
//!
//! The grid holds two same-shaped buffers of `lanes * length` cells. Exactly
//! one, `current`, is authoritative between ticks. During a tick `current`
//! is read-only and every write goes to `next`; afterwards [`swap`] exchanges
//! the two buffer handles.
//!
//! Writes into `next` go through a per-cell claim lock. A task takes one
//! lock, reads or writes the cell, and releases it before taking any other
//! lock, so no task ever holds two locks at once.
//!
//! [`swap`]: OccupancyGrid::swap

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::id::VehicleId;

/// Raw cell value meaning "no occupant".
const EMPTY: u32 = u32::MAX;

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// One occupancy buffer: a flat array of cells.
#[derive(Debug)]
struct OccupancyBuffer {
    cells: Box<[AtomicU32]>,
}

impl OccupancyBuffer {
    fn new(size: usize) -> Self {
        Self {
            cells: (0..size).map(|_| AtomicU32::new(EMPTY)).collect(),
        }
    }

    fn get(&self, index: usize) -> Option<VehicleId> {
        decode(self.cells[index].load(Ordering::Acquire))
    }

    fn clear(&self) {
        self.cells
            .par_iter()
            .for_each(|cell| cell.store(EMPTY, Ordering::Relaxed));
    }
}

fn decode(raw: u32) -> Option<VehicleId> {
    (raw != EMPTY).then_some(VehicleId(raw))
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Occupancy table over `(lane, position)` cells with a `current` and a
/// `next` buffer.
#[derive(Debug)]
pub struct OccupancyGrid {
    lanes: usize,
    length: usize,
    current: OccupancyBuffer,
    next: OccupancyBuffer,
    /// One claim lock per cell of the `next` buffer.
    locks: Box<[Mutex<()>]>,
}

impl OccupancyGrid {
    /// Create an empty grid of `lanes` lanes with `length` cells each.
    pub fn new(lanes: usize, length: usize) -> Self {
        let size = lanes * length;
        Self {
            lanes,
            length,
            current: OccupancyBuffer::new(size),
            next: OccupancyBuffer::new(size),
            locks: (0..size).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn cell_count(&self) -> usize {
        self.lanes * self.length
    }

    /// Index of the terminal cell of every lane.
    pub fn terminal(&self) -> usize {
        self.length - 1
    }

    /// Flat index of a `(lane, position)` cell.
    #[inline]
    pub fn index(&self, lane: usize, position: usize) -> usize {
        debug_assert!(lane < self.lanes && position < self.length);
        lane * self.length + position
    }

    /// Occupant of a cell in the authoritative `current` buffer.
    pub fn occupant(&self, lane: usize, position: usize) -> Option<VehicleId> {
        self.current.get(self.index(lane, position))
    }

    /// Occupant of a cell in `current`, addressed by flat index.
    #[inline]
    pub fn occupant_at(&self, index: usize) -> Option<VehicleId> {
        self.current.get(index)
    }

    /// Place a vehicle directly into `current`. Used when seeding a scenario.
    ///
    /// Returns `false` (and leaves the cell untouched) if the cell is taken.
    pub fn place(&mut self, lane: usize, position: usize, vehicle: VehicleId) -> bool {
        let index = self.index(lane, position);
        let cell = self.current.cells[index].get_mut();
        if *cell != EMPTY {
            return false;
        }
        *cell = vehicle.0;
        true
    }

    /// Empty every cell of the `next` buffer. Returns once all cells are
    /// cleared, so no claim can observe a stale value.
    pub fn clear_next(&self) {
        self.next.clear();
    }

    /// Try to claim a `next` cell for a vehicle that wants to enter it.
    ///
    /// Returns `false` if another vehicle already claimed the cell this tick.
    pub fn claim(&self, index: usize, vehicle: VehicleId) -> bool {
        let _guard = self.locks[index].lock();
        let cell = &self.next.cells[index];
        if cell.load(Ordering::Relaxed) != EMPTY {
            return false;
        }
        cell.store(vehicle.0, Ordering::Relaxed);
        true
    }

    /// Re-occupy a vehicle's own cell in `next` (a stay-claim).
    pub fn stay(&self, index: usize, vehicle: VehicleId) {
        let _guard = self.locks[index].lock();
        let previous = self.next.cells[index].swap(vehicle.0, Ordering::Relaxed);
        debug_assert!(
            previous == EMPTY || previous == vehicle.0,
            "stay-claim on cell {index} overwrote vehicle {previous}"
        );
    }

    /// Make `next` authoritative. The former `current` becomes the clearing
    /// target of the following tick.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Number of occupied cells in `current`.
    pub fn occupied_count(&self) -> usize {
        self.current
            .cells
            .par_iter()
            .filter(|cell| cell.load(Ordering::Relaxed) != EMPTY)
            .count()
    }

    /// Occupants of a single lane, in position order.
    pub fn lane_occupancy(&self, lane: usize) -> Vec<Option<VehicleId>> {
        (0..self.length)
            .map(|position| self.occupant(lane, position))
            .collect()
    }

    /// Copy of the whole `current` buffer in flat-index order.
    pub fn snapshot(&self) -> Vec<Option<VehicleId>> {
        (0..self.cell_count())
            .map(|index| self.current.get(index))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
