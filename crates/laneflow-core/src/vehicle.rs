//! Vehicle records and the dense population that owns them.

use serde::{Deserialize, Serialize};

use crate::id::VehicleId;

/// A single vehicle on a lane segment.
///
/// `position` only ever grows, one cell per tick at most. `alive` goes from
/// `true` to `false` exactly once, when the vehicle leaves the terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub lane: usize,
    pub position: usize,
    pub alive: bool,
}

/// Dense collection of vehicles. The vehicle at index `i` has id `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    vehicles: Vec<Vehicle>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vehicles: Vec::with_capacity(capacity),
        }
    }

    fn next_id(&self) -> VehicleId {
        VehicleId(self.vehicles.len() as u32)
    }

    /// Add a live vehicle at `(lane, position)` and return its id.
    pub fn push_at(&mut self, lane: usize, position: usize) -> VehicleId {
        let id = self.next_id();
        self.vehicles.push(Vehicle {
            id,
            lane,
            position,
            alive: true,
        });
        id
    }

    /// Add a vehicle that never made it onto the grid.
    pub fn push_dead(&mut self) -> VehicleId {
        let id = self.next_id();
        self.vehicles.push(Vehicle {
            id,
            lane: 0,
            position: 0,
            alive: false,
        });
        id
    }

    pub fn get(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Number of vehicles still on the grid.
    pub fn live_count(&self) -> usize {
        self.vehicles.iter().filter(|v| v.alive).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter()
    }

    /// Mutable access for the step engine, which hands disjoint chunks of
    /// this slice to its workers.
    pub fn as_mut_slice(&mut self) -> &mut [Vehicle] {
        &mut self.vehicles
    }
}
