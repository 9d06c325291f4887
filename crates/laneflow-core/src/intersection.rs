//! Dual-axis intersection controller.
//!
//! One controller gates two crossing flows: the north-south (vertical) axis
//! and the east-west (horizontal) axis. It runs a four-state cycle
//!
//! ```text
//! NS_GREEN -> NS_YELLOW -> EW_GREEN -> EW_YELLOW -> NS_GREEN
//! ```
//!
//! encoded as a top-level [`Phase`] plus one [`LightColor`] per axis. At most
//! one axis is ever non-RED, and only GREEN lets traffic into the
//! intersection cell: YELLOW stops vehicles exactly like RED.

use serde::{Deserialize, Serialize};

use crate::engine::Gate;
use crate::error::ConfigError;
use crate::signal::LightColor;

// ---------------------------------------------------------------------------
// Phases and timings
// ---------------------------------------------------------------------------

/// Which axis currently holds, or is yielding, right-of-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    NsGreen,
    EwGreen,
}

/// Flattened view of the controller's four logical states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalPhase {
    NsGreen,
    NsYellow,
    EwGreen,
    EwYellow,
}

/// Green and yellow durations for one axis. An axis is RED for as long as
/// the other axis is GREEN or YELLOW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisTimings {
    pub green: u32,
    pub yellow: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionTimings {
    pub ns: AxisTimings,
    pub ew: AxisTimings,
}

impl IntersectionTimings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("ns green", self.ns.green),
            ("ns yellow", self.ns.yellow),
            ("ew green", self.ew.green),
            ("ew yellow", self.ew.yellow),
        ];
        for (state, duration) in checks {
            if duration == 0 {
                return Err(ConfigError::ZeroDuration { state });
            }
        }
        Ok(())
    }
}

impl Default for IntersectionTimings {
    fn default() -> Self {
        let axis = AxisTimings {
            green: 6,
            yellow: 2,
        };
        Self { ns: axis, ew: axis }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionController {
    phase: Phase,
    timings: IntersectionTimings,
    timer: u32,
    ns: LightColor,
    ew: LightColor,
}

impl IntersectionController {
    /// Start in NS_GREEN with the timer loaded from the NS green duration.
    pub fn new(timings: IntersectionTimings) -> Result<Self, ConfigError> {
        timings.validate()?;
        Ok(Self {
            phase: Phase::NsGreen,
            timings,
            timer: timings.ns.green,
            ns: LightColor::Green,
            ew: LightColor::Red,
        })
    }

    /// Advance the controller by one tick.
    pub fn step(&mut self) {
        self.timer = self.timer.saturating_sub(1);
        if self.timer > 0 {
            return;
        }
        let t = self.timings;
        match (self.phase, self.ns, self.ew) {
            (Phase::NsGreen, LightColor::Green, _) => {
                self.ns = LightColor::Yellow;
                self.ew = LightColor::Red;
                self.timer = t.ns.yellow;
            }
            (Phase::NsGreen, _, _) => {
                self.phase = Phase::EwGreen;
                self.ns = LightColor::Red;
                self.ew = LightColor::Green;
                self.timer = t.ew.green;
            }
            (Phase::EwGreen, _, LightColor::Green) => {
                self.ew = LightColor::Yellow;
                self.ns = LightColor::Red;
                self.timer = t.ew.yellow;
            }
            (Phase::EwGreen, _, _) => {
                self.phase = Phase::NsGreen;
                self.ns = LightColor::Green;
                self.ew = LightColor::Red;
                self.timer = t.ns.green;
            }
        }
    }

    /// East-west traffic may not enter the intersection cell.
    pub fn blocks_horizontal(&self) -> bool {
        self.ew != LightColor::Green
    }

    /// North-south traffic may not enter the intersection cell.
    pub fn blocks_vertical(&self) -> bool {
        self.ns != LightColor::Green
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn logical_phase(&self) -> SignalPhase {
        match (self.phase, self.ns, self.ew) {
            (Phase::NsGreen, LightColor::Green, _) => SignalPhase::NsGreen,
            (Phase::NsGreen, _, _) => SignalPhase::NsYellow,
            (Phase::EwGreen, _, LightColor::Green) => SignalPhase::EwGreen,
            (Phase::EwGreen, _, _) => SignalPhase::EwYellow,
        }
    }

    pub fn ns(&self) -> LightColor {
        self.ns
    }

    pub fn ew(&self) -> LightColor {
        self.ew
    }

    pub fn timer(&self) -> u32 {
        self.timer
    }

    /// Freeze both axes' gating state for one tick.
    pub fn gates(&self, col_h: usize, row_v: usize) -> CrossingGates {
        CrossingGates {
            horizontal: AxisGate {
                cell: col_h,
                closed: self.blocks_horizontal(),
            },
            vertical: AxisGate {
                cell: row_v,
                closed: self.blocks_vertical(),
            },
        }
    }
}

/// Gating state of one axis: a single cell, open or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisGate {
    pub cell: usize,
    pub closed: bool,
}

impl Gate for AxisGate {
    fn blocks(&self, destination: usize) -> bool {
        self.closed && destination == self.cell
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossingGates {
    pub horizontal: AxisGate,
    pub vertical: AxisGate,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(ns_green: u32, ns_yellow: u32, ew_green: u32, ew_yellow: u32) -> IntersectionController {
        IntersectionController::new(IntersectionTimings {
            ns: AxisTimings {
                green: ns_green,
                yellow: ns_yellow,
            },
            ew: AxisTimings {
                green: ew_green,
                yellow: ew_yellow,
            },
        })
        .unwrap()
    }

    #[test]
    fn starts_ns_green() {
        let c = controller(4, 1, 3, 2);
        assert_eq!(c.logical_phase(), SignalPhase::NsGreen);
        assert_eq!((c.ns(), c.ew()), (LightColor::Green, LightColor::Red));
        assert_eq!(c.timer(), 4);
        assert!(!c.blocks_vertical());
        assert!(c.blocks_horizontal());
    }

    #[test]
    fn full_cycle_follows_transition_table() {
        let mut c = controller(2, 1, 3, 1);
        let mut phases = Vec::new();
        for _ in 0..8 {
            c.step();
            phases.push((c.logical_phase(), c.timer()));
        }
        use SignalPhase::*;
        assert_eq!(
            phases,
            vec![
                (NsGreen, 1),
                (NsYellow, 1),
                (EwGreen, 3),
                (EwGreen, 2),
                (EwGreen, 1),
                (EwYellow, 1),
                (NsGreen, 2),
                (NsGreen, 1),
            ]
        );
    }

    #[test]
    fn never_two_axes_non_red() {
        let mut c = controller(3, 2, 4, 1);
        for _ in 0..200 {
            let non_red = [c.ns(), c.ew()]
                .iter()
                .filter(|&&color| color != LightColor::Red)
                .count();
            assert_eq!(non_red, 1);
            assert!(!(c.ns() == LightColor::Green && c.ew() == LightColor::Green));
            c.step();
        }
    }

    #[test]
    fn yellow_blocks_like_red() {
        let mut c = controller(1, 2, 1, 1);
        c.step();
        assert_eq!(c.logical_phase(), SignalPhase::NsYellow);
        assert!(c.blocks_vertical());
        assert!(c.blocks_horizontal());
    }

    #[test]
    fn phase_tracks_right_of_way_holder() {
        let mut c = controller(1, 1, 1, 1);
        assert_eq!(c.phase(), Phase::NsGreen);
        c.step(); // NS yellow
        assert_eq!(c.phase(), Phase::NsGreen);
        c.step(); // EW green
        assert_eq!(c.phase(), Phase::EwGreen);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let err = IntersectionController::new(IntersectionTimings {
            ns: AxisTimings { green: 1, yellow: 1 },
            ew: AxisTimings { green: 0, yellow: 1 },
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroDuration { state: "ew green" }));
    }

    #[test]
    fn gates_only_close_their_own_cell() {
        let c = controller(4, 1, 4, 1);
        let gates = c.gates(5, 7);
        assert!(gates.horizontal.blocks(5));
        assert!(!gates.horizontal.blocks(4));
        assert!(!gates.vertical.blocks(7));
    }
}
