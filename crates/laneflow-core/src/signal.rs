//! Single-point traffic lights.
//!
//! Each [`TrafficLight`] governs one cell of a road. A light cycles
//! GREEN -> YELLOW -> RED -> GREEN, holding each color for the number of
//! ticks given by its [`LightTimings`]. Only RED stops traffic; YELLOW lets
//! vehicles through.

use serde::{Deserialize, Serialize};

use crate::engine::Gate;
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Colors and timings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightColor {
    Red,
    Yellow,
    Green,
}

impl LightColor {
    /// The color that follows this one in the cycle.
    pub fn next(self) -> Self {
        match self {
            LightColor::Green => LightColor::Yellow,
            LightColor::Yellow => LightColor::Red,
            LightColor::Red => LightColor::Green,
        }
    }
}

/// How many ticks a light holds each color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightTimings {
    pub red: u32,
    pub yellow: u32,
    pub green: u32,
}

impl LightTimings {
    pub fn duration(&self, color: LightColor) -> u32 {
        match color {
            LightColor::Red => self.red,
            LightColor::Yellow => self.yellow,
            LightColor::Green => self.green,
        }
    }

    /// Reject any color that would last zero ticks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (state, duration) in [("red", self.red), ("yellow", self.yellow), ("green", self.green)]
        {
            if duration == 0 {
                return Err(ConfigError::ZeroDuration { state });
            }
        }
        Ok(())
    }
}

impl Default for LightTimings {
    fn default() -> Self {
        Self {
            red: 3,
            yellow: 1,
            green: 3,
        }
    }
}

/// Check that `cell` is a legal gate position on a segment of `length`.
///
/// Gates may not sit on the first cell (nothing can enter it) or the
/// terminal cell (vehicles exit from it).
pub(crate) fn check_gate(cell: usize, length: usize) -> Result<(), ConfigError> {
    let max = length.saturating_sub(2);
    if cell < 1 || cell > max {
        return Err(ConfigError::GateOutOfRange { cell, max, length });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Traffic light
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficLight {
    position: usize,
    timings: LightTimings,
    timer: u32,
    color: LightColor,
}

impl TrafficLight {
    /// Create a light showing `initial`, with the timer loaded from that
    /// color's duration.
    pub fn new(position: usize, timings: LightTimings, initial: LightColor) -> Self {
        Self {
            position,
            timings,
            timer: timings.duration(initial),
            color: initial,
        }
    }

    /// Advance the light by one tick.
    pub fn step(&mut self) {
        self.timer = self.timer.saturating_sub(1);
        if self.timer > 0 {
            return;
        }
        self.color = self.color.next();
        self.timer = self.timings.duration(self.color);
    }

    /// True iff a vehicle must not enter `destination` right now.
    pub fn blocks(&self, destination: usize) -> bool {
        destination == self.position && self.color == LightColor::Red
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn color(&self) -> LightColor {
        self.color
    }

    /// Ticks left in the current color.
    pub fn timer(&self) -> u32 {
        self.timer
    }
}

// ---------------------------------------------------------------------------
// Light bank
// ---------------------------------------------------------------------------

/// A set of independent lights along one road.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightBank {
    lights: Vec<TrafficLight>,
}

impl LightBank {
    /// Build a bank from explicit lights, checking each position against the
    /// road `length`.
    pub fn new(lights: Vec<TrafficLight>, length: usize) -> Result<Self, ConfigError> {
        for light in &lights {
            check_gate(light.position, length)?;
            light.timings.validate()?;
        }
        Ok(Self { lights })
    }

    /// Spread `count` lights evenly along a road of `length` cells.
    ///
    /// Light `i` sits at `(i + 1) * (length / (count + 1))`. Even-numbered
    /// lights start GREEN and odd-numbered ones start RED.
    pub fn evenly_spaced(
        count: usize,
        length: usize,
        timings: LightTimings,
    ) -> Result<Self, ConfigError> {
        let spacing = length / (count + 1);
        let lights = (0..count)
            .map(|i| {
                let initial = if i % 2 == 0 {
                    LightColor::Green
                } else {
                    LightColor::Red
                };
                TrafficLight::new((i + 1) * spacing, timings, initial)
            })
            .collect();
        Self::new(lights, length)
    }

    /// Advance every light by one tick.
    pub fn step_all(&mut self) {
        for light in &mut self.lights {
            light.step();
        }
    }

    /// Freeze the current gating state for a road of `length` cells.
    pub fn snapshot(&self, length: usize) -> LightSnapshot {
        let mut red = vec![false; length];
        for light in &self.lights {
            if light.blocks(light.position) {
                red[light.position] = true;
            }
        }
        LightSnapshot {
            red: red.into_boxed_slice(),
        }
    }

    pub fn colors(&self) -> Vec<LightColor> {
        self.lights.iter().map(TrafficLight::color).collect()
    }

    pub fn lights(&self) -> &[TrafficLight] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}

/// Per-cell RED mask captured at the start of a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightSnapshot {
    red: Box<[bool]>,
}

impl Gate for LightSnapshot {
    fn blocks(&self, destination: usize) -> bool {
        self.red.get(destination).copied().unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
