//! A single multi-lane road governed by a bank of independent lights.

use tracing::debug;

use crate::config::CorridorConfig;
use crate::engine::{self, PassOutcome};
use crate::error::SimError;
use crate::grid::OccupancyGrid;
use crate::report::{ReportSchedule, Reporter, RoadReport, SignalReport, TickReport};
use crate::seed::seed;
use crate::signal::{LightBank, check_gate};
use crate::sim::{SimState, occupancy_hash};
use crate::vehicle::Population;
use crate::workers::{WorkerPolicy, WorkerPools};

/// One road, its vehicles, and its lights.
#[derive(Debug)]
pub struct Corridor {
    pub population: Population,
    pub grid: OccupancyGrid,
    pub lights: LightBank,
    pub sim_state: SimState,
    policy: WorkerPolicy,
    pools: WorkerPools,
    dead_on_arrival: usize,
    #[cfg(feature = "profiling")]
    last_profile: Option<crate::profiling::TickProfile>,
}

impl Corridor {
    /// Validate `config`, seed the road, and lay out the lights.
    pub fn new(config: &CorridorConfig) -> Result<Self, SimError> {
        config.validate()?;
        let road = &config.road;
        let seeded = seed(road.vehicle_count(), road.lanes, road.length, config.run.seed);
        let lights = LightBank::evenly_spaced(config.lights, road.length, config.timings)?;
        let mut corridor = Self::from_parts(
            seeded.population,
            seeded.grid,
            lights,
            config.run.worker_policy(),
        )?;
        corridor.dead_on_arrival = seeded.dead_on_arrival;
        Ok(corridor)
    }

    /// Assemble a corridor from pre-built parts. The grid must already hold
    /// every live vehicle of `population` at its recorded cell. Every light
    /// is checked against the grid's length.
    pub fn from_parts(
        population: Population,
        grid: OccupancyGrid,
        lights: LightBank,
        policy: WorkerPolicy,
    ) -> Result<Self, SimError> {
        for light in lights.lights() {
            check_gate(light.position(), grid.length())?;
        }
        Ok(Self {
            population,
            grid,
            lights,
            sim_state: SimState::new(),
            policy,
            pools: WorkerPools::new(),
            dead_on_arrival: 0,
            #[cfg(feature = "profiling")]
            last_profile: None,
        })
    }

    /// Vehicles that seeding could not place.
    pub fn dead_on_arrival(&self) -> usize {
        self.dead_on_arrival
    }

    /// Fingerprint of the current occupancy pattern.
    pub fn occupancy_hash(&self) -> u64 {
        occupancy_hash(&self.grid)
    }

    /// Run one tick.
    ///
    /// The lights' gating state is frozen first. The light bank then steps
    /// concurrently with the vehicle pass, which only reads the frozen copy.
    pub fn step(&mut self) -> Result<TickReport, SimError> {
        #[cfg(feature = "profiling")]
        let step_start = std::time::Instant::now();

        let workers = self.policy.workers_for(self.population.live_count());
        let pool = self.pools.get(workers)?;

        let gate = self.lights.snapshot(self.grid.length());
        let lights = &mut self.lights;
        let population = &mut self.population;
        let grid = &mut self.grid;
        let ((), outcome): ((), PassOutcome) = pool.install(|| {
            rayon::join(
                || lights.step_all(),
                || engine::advance(population, grid, &gate),
            )
        });

        #[cfg(feature = "profiling")]
        let flow_dur = step_start.elapsed();
        #[cfg(feature = "profiling")]
        let phase_start = std::time::Instant::now();

        self.sim_state.tick += 1;
        let report = TickReport {
            tick: self.sim_state.tick,
            roads: vec![RoadReport {
                moved: outcome.moved,
                exited: outcome.exited,
                occupied: self.grid.occupied_count(),
                live: self.population.live_count(),
                contended: outcome.contended,
            }],
            signals: SignalReport::Lights(self.lights.colors()),
            workers,
        };
        debug!(
            tick = report.tick,
            moved = outcome.moved,
            exited = outcome.exited,
            workers,
            "corridor tick"
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
