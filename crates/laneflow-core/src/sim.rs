//! Simulation state and occupancy fingerprints.

use crate::grid::OccupancyGrid;

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable simulation state tracked by the orchestrators.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Number of ticks completed so far.
    pub tick: u64,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash for comparing runs.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

/// Fingerprint of which cells of `current` are occupied.
///
/// Vehicle identities are not hashed. Only the occupancy pattern is stable
/// across worker counts.
pub fn occupancy_hash(grid: &OccupancyGrid) -> u64 {
    let mut hash = StateHash::new();
    hash.write_u64(grid.lanes() as u64);
    hash.write_u64(grid.length() as u64);
    for (index, cell) in grid.snapshot().iter().enumerate() {
        if cell.is_some() {
            hash.write_u64(index as u64);
        }
    }
    hash.finish()
}
