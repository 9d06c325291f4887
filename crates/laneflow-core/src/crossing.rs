//! Two crossing roads sharing one intersection controller.
//!
//! The horizontal (east-west) road is gated at cell `col_h`, the vertical
//! (north-south) road at cell `row_v`. Each tick runs three concurrent
//! tasks: the controller step and one advance pass per road. Both passes
//! read a [`CrossingGates`] frozen before the controller moves.

use tracing::debug;

use crate::config::CrossingConfig;
use crate::engine::{self, PassOutcome};
use crate::error::SimError;
use crate::grid::OccupancyGrid;
use crate::intersection::{CrossingGates, IntersectionController};
use crate::report::{ReportSchedule, Reporter, RoadReport, SignalReport, TickReport};
use crate::seed::{Seeded, seed};
use crate::signal::check_gate;
use crate::sim::{SimState, StateHash, occupancy_hash};
use crate::vehicle::Population;
use crate::workers::{WorkerPolicy, WorkerPools};

/// Offset mixed into the run seed for the vertical road, so the two roads
/// are not seeded identically.
const VERTICAL_SEED_SALT: u64 = 0x5EED_0F_C0FFEE;

/// A road segment and the vehicles on it.
#[derive(Debug)]
pub struct Road {
    pub population: Population,
    pub grid: OccupancyGrid,
}

impl Road {
    fn report(&self, outcome: PassOutcome) -> RoadReport {
        RoadReport {
            moved: outcome.moved,
            exited: outcome.exited,
            occupied: self.grid.occupied_count(),
            live: self.population.live_count(),
            contended: outcome.contended,
        }
    }
}

impl From<Seeded> for Road {
    fn from(seeded: Seeded) -> Self {
        Self {
            population: seeded.population,
            grid: seeded.grid,
        }
    }
}

#[derive(Debug)]
pub struct Crossing {
    pub horizontal: Road,
    pub vertical: Road,
    pub controller: IntersectionController,
    pub sim_state: SimState,
    col_h: usize,
    row_v: usize,
    policy: WorkerPolicy,
    pools: WorkerPools,
    dead_on_arrival: usize,
    #[cfg(feature = "profiling")]
    last_profile: Option<crate::profiling::TickProfile>,
}

impl Crossing {
    /// Validate `config` and seed both roads.
    pub fn new(config: &CrossingConfig) -> Result<Self, SimError> {
        config.validate()?;
        let h = &config.horizontal;
        let v = &config.vertical;
        let seed_h = seed(h.vehicle_count(), h.lanes, h.length, config.run.seed);
        let seed_v = seed(
            v.vehicle_count(),
            v.lanes,
            v.length,
            config.run.seed ^ VERTICAL_SEED_SALT,
        );
        let dead_on_arrival = seed_h.dead_on_arrival + seed_v.dead_on_arrival;
        let controller = IntersectionController::new(config.timings)?;
        let mut crossing = Self::from_parts(
            seed_h.into(),
            seed_v.into(),
            controller,
            config.col_h(),
            config.row_v(),
            config.run.worker_policy(),
        )?;
        crossing.dead_on_arrival = dead_on_arrival;
        Ok(crossing)
    }

    /// Assemble a crossing from pre-built roads. Gate cells are checked
    /// against each road's length.
    pub fn from_parts(
        horizontal: Road,
        vertical: Road,
        controller: IntersectionController,
        col_h: usize,
        row_v: usize,
        policy: WorkerPolicy,
    ) -> Result<Self, SimError> {
        check_gate(col_h, horizontal.grid.length())?;
        check_gate(row_v, vertical.grid.length())?;
        Ok(Self {
            horizontal,
            vertical,
            controller,
            sim_state: SimState::new(),
            col_h,
            row_v,
            policy,
            pools: WorkerPools::new(),
            dead_on_arrival: 0,
            #[cfg(feature = "profiling")]
            last_profile: None,
        })
    }

    pub fn col_h(&self) -> usize {
        self.col_h
    }

    pub fn row_v(&self) -> usize {
        self.row_v
    }

    pub fn dead_on_arrival(&self) -> usize {
        self.dead_on_arrival
    }

    /// Gating state the next tick's passes will see.
    pub fn gates(&self) -> CrossingGates {
        self.controller.gates(self.col_h, self.row_v)
    }

    /// Combined fingerprint of both roads' occupancy.
    pub fn occupancy_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(occupancy_hash(&self.horizontal.grid));
        hash.write_u64(occupancy_hash(&self.vertical.grid));
        hash.finish()
    }

    /// Run one tick.
    pub fn step(&mut self) -> Result<TickReport, SimError> {
        #[cfg(feature = "profiling")]
        let step_start = std::time::Instant::now();

        let gates = self.controller.gates(self.col_h, self.row_v);
        let live = self.horizontal.population.live_count() + self.vertical.population.live_count();
        let workers = self.policy.workers_for(live);
        let pool = self.pools.get(workers)?;

        let controller = &mut self.controller;
        let h = &mut self.horizontal;
        let v = &mut self.vertical;
        let ((), (out_h, out_v)): ((), (PassOutcome, PassOutcome)) = pool.install(|| {
            rayon::join(
                || controller.step(),
                || {
                    rayon::join(
                        || engine::advance(&mut h.population, &mut h.grid, &gates.horizontal),
                        || engine::advance(&mut v.population, &mut v.grid, &gates.vertical),
                    )
                },
            )
        });

        #[cfg(feature = "profiling")]
        let flow_dur = step_start.elapsed();
        #[cfg(feature = "profiling")]
        let phase_start = std::time::Instant::now();

        self.sim_state.tick += 1;
        let report = TickReport {
            tick: self.sim_state.tick,
            roads: vec![self.horizontal.report(out_h), self.vertical.report(out_v)],
            signals: SignalReport::Intersection {
                phase: self.controller.logical_phase(),
                ns: self.controller.ns(),
                ew: self.controller.ew(),
                timer: self.controller.timer(),
            },
            workers,
        };
        debug!(
            tick = report.tick,
            moved_h = out_h.moved,
            moved_v = out_v.moved,
            phase = ?self.controller.logical_phase(),
            workers,
            "crossing tick"
        );

        #[cfg(feature = "profiling")]
        {
            self.last_profile = Some(crate::profiling::TickProfile {
                signals_and_flow: flow_dur,
                metrics: phase_start.elapsed(),
                total: step_start.elapsed(),
                tick: self.sim_state.tick,
            });
        }

        Ok(report)
    }

    /// Run `ticks` ticks, handing due reports to `reporter`.
    pub fn run(
        &mut self,
        ticks: u64,
        schedule: ReportSchedule,
        reporter: &mut dyn Reporter,
    ) -> Result<(), SimError> {
        for _ in 0..ticks {
            let report = self.step()?;
            if schedule.due(report.tick) {
                reporter.report(&report);
            }
        }
        Ok(())
    }

    /// Timing of the most recent tick.
    #[cfg(feature = "profiling")]
    pub fn last_tick_profile(&self) -> Option<&crate::profiling::TickProfile> {
        self.last_profile.as_ref()
    }
}
