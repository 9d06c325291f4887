use serde::{Deserialize, Serialize};

/// Identifies a vehicle in a [`Population`](crate::vehicle::Population).
///
/// Ids are dense: the id of a vehicle is its index in the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub u32);

impl VehicleId {
    /// Largest raw value a vehicle id may take. `u32::MAX` marks an empty
    /// grid cell.
    pub const MAX: u32 = u32::MAX - 1;

    /// Index of this vehicle in its population.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
