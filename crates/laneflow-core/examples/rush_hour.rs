//! Rush hour example: a crowded corridor draining through three lights.
//!
//! Seeds a dense road, runs it until every vehicle has left, and prints
//! throughput and the light colors at each report.
//!
//! Run with: `cargo run -p laneflow-core --example rush_hour`

use laneflow_core::config::{CorridorConfig, RoadConfig, RunConfig};
use laneflow_core::corridor::Corridor;
use laneflow_core::report::{ReportSchedule, Reporter, SignalReport, TickReport};
use laneflow_core::signal::LightTimings;

struct Printer;

impl Reporter for Printer {
    fn report(&mut self, report: &TickReport) {
        let lights = match &report.signals {
            SignalReport::Lights(colors) => format!("{colors:?}"),
            SignalReport::Intersection { phase, .. } => format!("{phase:?}"),
        };
        println!(
            "tick {:>4}  moved {:>4}  on road {:>4}  workers {}  lights {}",
            report.tick,
            report.moved(),
            report.occupied(),
            report.workers,
            lights
        );
    }
}

fn main() {
    let config = CorridorConfig {
        road: RoadConfig {
            lanes: 4,
            length: 200,
            vehicles: Some(400),
        },
        lights: 3,
        timings: LightTimings {
            red: 8,
            yellow: 2,
            green: 6,
        },
        run: RunConfig {
            seed: 2024,
            ..Default::default()
        },
    };

    let mut corridor = Corridor::new(&config).unwrap();
    println!(
        "seeded {} vehicles ({} dead on arrival)",
        corridor.population.len(),
        corridor.dead_on_arrival()
    );

    let schedule = ReportSchedule::every(25);
    let mut printer = Printer;
    while corridor.population.live_count() > 0 {
        let report = corridor.step().unwrap();
        if schedule.due(report.tick) {
            printer.report(&report);
        }
    }
    println!("road clear after {} ticks", corridor.sim_state.tick);
}
