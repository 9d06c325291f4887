//! Per-tick metrics and the reporting seam.
//!
//! The orchestrators build a [`TickReport`] after every tick. A [`Reporter`]
//! receives the reports that fall on its [`ReportSchedule`]. Reporters get a
//! shared reference and cannot touch simulation state.

use serde::{Deserialize, Serialize};

use crate::intersection::SignalPhase;
use crate::signal::LightColor;

/// Metrics for one road after a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadReport {
    pub moved: u64,
    pub exited: u64,
    /// Occupied cells in the new `current` buffer.
    pub occupied: usize,
    pub live: usize,
    /// Destination claims lost to a concurrent claimant.
    pub contended: u64,
}

/// Controller state after a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalReport {
    Lights(Vec<LightColor>),
    Intersection {
        phase: SignalPhase,
        ns: LightColor,
        ew: LightColor,
        timer: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// 1-based number of the tick just completed.
    pub tick: u64,
    /// One entry per road: a corridor has one, a crossing has horizontal
    /// then vertical.
    pub roads: Vec<RoadReport>,
    pub signals: SignalReport,
    /// Worker threads used for the tick.
    pub workers: usize,
}

impl TickReport {
    pub fn moved(&self) -> u64 {
        self.roads.iter().map(|r| r.moved).sum()
    }

    pub fn occupied(&self) -> usize {
        self.roads.iter().map(|r| r.occupied).sum()
    }

    pub fn contended(&self) -> u64 {
        self.roads.iter().map(|r| r.contended).sum()
    }
}

/// Consumer of tick reports.
pub trait Reporter {
    fn report(&mut self, report: &TickReport);
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _report: &TickReport) {}
}

/// Collects every report it receives.
impl Reporter for Vec<TickReport> {
    fn report(&mut self, report: &TickReport) {
        self.push(report.clone());
    }
}

/// Which ticks get reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSchedule {
    pub interval: u64,
}

impl ReportSchedule {
    pub fn every(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    pub fn due(&self, tick: u64) -> bool {
        tick % self.interval.max(1) == 0
    }
}

impl Default for ReportSchedule {
    fn default() -> Self {
        Self { interval: 20 }
    }
}
