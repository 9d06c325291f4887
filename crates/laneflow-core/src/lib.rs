//! Laneflow Core -- a parallel cellular-automaton traffic simulator.
//!
//! Vehicles live on straight one-dimensional lane segments. Every tick each
//! live vehicle either advances exactly one cell, stays in place, or exits at
//! the terminal cell. Signals gate entry into designated cells.
//!
//! # Tick Pipeline
//!
//! Each call to [`corridor::Corridor::step`] or [`crossing::Crossing::step`]
//! advances the simulation by one tick:
//!
//! 1. **Freeze** -- capture the gating state of every signal controller.
//! 2. **Signals + flow** -- step the controllers and run the vehicle-advance
//!    passes concurrently. Passes only read the frozen gating state.
//! 3. **Swap** -- each grid exchanges its `current` and `next` buffers.
//! 4. **Metrics** -- occupancy is counted and a [`report::TickReport`] built.
//!
//! # Key Types
//!
//! - [`grid::OccupancyGrid`] -- double-buffered occupancy with one claim lock
//!   per cell.
//! - [`vehicle::Population`] -- dense vehicle records addressed by
//!   [`id::VehicleId`].
//! - [`signal::LightBank`] -- independent single-point traffic lights.
//! - [`intersection::IntersectionController`] -- dual-axis phase machine.
//! - [`engine::advance`] -- the parallel grid-advance pass.
//! - [`seed::seed`] -- reproducible rejection-sampling scenario seeding.

pub mod config;
pub mod corridor;
pub mod crossing;
pub mod engine;
pub mod error;
pub mod grid;
pub mod id;
pub mod intersection;
pub mod profiling;
pub mod report;
pub mod rng;
pub mod seed;
pub mod signal;
pub mod sim;
pub mod vehicle;
pub mod workers;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ConfigError, SimError};
