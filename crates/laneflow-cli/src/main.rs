//! `laneflow`: run a corridor or crossing scenario and print periodic reports.
//!
//! Reports are handed to a printer thread over a channel, so console output
//! never holds up a tick.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use crossbeam_channel::{Receiver, Sender};
use laneflow_core::config::{
    CorridorConfig, CrossingConfig, RoadConfig, RunConfig, ScenarioConfig, load_config,
};
use laneflow_core::corridor::Corridor;
use laneflow_core::crossing::Crossing;
use laneflow_core::report::{ReportSchedule, Reporter, SignalReport, TickReport};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,

    /// Seed for initial vehicle placement.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print a report every this many ticks.
    #[arg(
        long,
        global = true,
        value_name = "TICKS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    report_every: Option<u64>,

    /// Upper bound on worker threads per tick.
    #[arg(long, global = true, value_name = "THREADS")]
    max_workers: Option<usize>,

    /// Increase log detail (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// One multi-lane road with evenly spaced traffic lights.
    Corridor {
        #[arg(default_value_t = 3)]
        lanes: usize,
        #[arg(default_value_t = 120)]
        length: usize,
        #[arg(default_value_t = 2)]
        lights: usize,
        #[arg(default_value_t = 200)]
        ticks: u64,
        /// Defaults to one vehicle per six cells.
        vehicles: Option<usize>,
    },
    /// Two roads crossing at one signalled intersection.
    Crossing {
        #[arg(default_value_t = 3)]
        lanes_h: usize,
        #[arg(default_value_t = 120)]
        length_h: usize,
        #[arg(default_value_t = 3)]
        lanes_v: usize,
        #[arg(default_value_t = 120)]
        length_v: usize,
        /// Intersection cell on the horizontal road. Defaults to the middle.
        col_h: Option<usize>,
        /// Intersection cell on the vertical road. Defaults to the middle.
        row_v: Option<usize>,
        #[arg(default_value_t = 200)]
        ticks: u64,
        vehicles_h: Option<usize>,
        vehicles_v: Option<usize>,
    },
    /// Run a scenario file (.ron, .toml or .json).
    Run { config: PathBuf },
}

impl Command {
    fn into_scenario(self) -> Result<ScenarioConfig> {
        let scenario = match self {
            Command::Corridor {
                lanes,
                length,
                lights,
                ticks,
                vehicles,
            } => ScenarioConfig::Corridor(CorridorConfig {
                road: RoadConfig {
                    lanes,
                    length,
                    vehicles,
                },
                lights,
                run: RunConfig {
                    ticks,
                    ..Default::default()
                },
                ..Default::default()
            }),
            Command::Crossing {
                lanes_h,
                length_h,
                lanes_v,
                length_v,
                col_h,
                row_v,
                ticks,
                vehicles_h,
                vehicles_v,
            } => ScenarioConfig::Crossing(CrossingConfig {
                horizontal: RoadConfig {
                    lanes: lanes_h,
                    length: length_h,
                    vehicles: vehicles_h,
                },
                vertical: RoadConfig {
                    lanes: lanes_v,
                    length: length_v,
                    vehicles: vehicles_v,
                },
                col_h,
                row_v,
                run: RunConfig {
                    ticks,
                    ..Default::default()
                },
                ..Default::default()
            }),
            Command::Run { config } => load_config(&config)
                .with_context(|| format!("failed to load scenario {}", config.display()))?,
        };
        Ok(scenario)
    }
}

// ===========================================================================
// Reporting
// ===========================================================================

/// Forwards due reports to the printer thread.
struct ChannelReporter {
    tx: Sender<TickReport>,
}

impl Reporter for ChannelReporter {
    fn report(&mut self, report: &TickReport) {
        if self.tx.send(report.clone()).is_err() {
            warn!(tick = report.tick, "report printer has stopped");
        }
    }
}

fn format_report(report: &TickReport) -> String {
    let moved: Vec<String> = report.roads.iter().map(|r| r.moved.to_string()).collect();
    let occupied: Vec<String> = report.roads.iter().map(|r| r.occupied.to_string()).collect();
    let signal = match &report.signals {
        SignalReport::Lights(colors) => match colors.first() {
            Some(color) => format!("light0={color:?}"),
            None => "light0=none".to_string(),
        },
        SignalReport::Intersection { ns, ew, timer, .. } => {
            format!("ns={ns:?} ew={ew:?} timer={timer}")
        }
    };
    format!(
        "Iter {} | moved={} | occ={} | {} | threads={}",
        report.tick,
        moved.join("/"),
        occupied.join("/"),
        signal,
        report.workers
    )
}

fn spawn_printer(rx: Receiver<TickReport>) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("laneflow-report".into())
        .spawn(move || {
            for report in rx {
                println!("{}", format_report(&report));
            }
        })
        .context("failed to start report printer")?;
    Ok(handle)
}

// ===========================================================================
// Entry point
// ===========================================================================

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose)?;

    let mut scenario = args.command.into_scenario()?;
    {
        let run = scenario.run_mut();
        if let Some(seed) = args.seed {
            run.seed = seed;
        }
        if let Some(every) = args.report_every {
            run.report_every = every;
        }
        if args.max_workers.is_some() {
            run.max_workers = args.max_workers;
        }
    }
    scenario.validate()?;

    let run = scenario.run().clone();
    let schedule = ReportSchedule::every(run.report_every);
    let (tx, rx) = crossbeam_channel::unbounded();
    let printer = spawn_printer(rx)?;
    let mut reporter = ChannelReporter { tx };

    match &scenario {
        ScenarioConfig::Corridor(config) => {
            let mut corridor = Corridor::new(config)?;
            corridor.run(run.ticks, schedule, &mut reporter)?;
            info!(
                ticks = corridor.sim_state.tick,
                remaining = corridor.population.live_count(),
                dead_on_arrival = corridor.dead_on_arrival(),
                "corridor finished"
            );
        }
        ScenarioConfig::Crossing(config) => {
            let mut crossing = Crossing::new(config)?;
            crossing.run(run.ticks, schedule, &mut reporter)?;
            info!(
                ticks = crossing.sim_state.tick,
                remaining_h = crossing.horizontal.population.live_count(),
                remaining_v = crossing.vertical.population.live_count(),
                dead_on_arrival = crossing.dead_on_arrival(),
                "crossing finished"
            );
        }
    }

    drop(reporter);
    printer
        .join()
        .map_err(|_| anyhow!("report printer panicked"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use laneflow_core::report::RoadReport;
    use laneflow_core::signal::LightColor;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }

    #[test]
    fn corridor_positionals_fill_config() {
        let args = CliArgs::parse_from(["laneflow", "corridor", "2", "50", "1", "10"]);
        let ScenarioConfig::Corridor(c) = args.command.into_scenario().unwrap() else {
            panic!("expected corridor");
        };
        assert_eq!((c.road.lanes, c.road.length, c.lights, c.run.ticks), (2, 50, 1, 10));
        assert_eq!(c.road.vehicles, None);
    }

    #[test]
    fn crossing_defaults() {
        let args = CliArgs::parse_from(["laneflow", "crossing"]);
        let ScenarioConfig::Crossing(c) = args.command.into_scenario().unwrap() else {
            panic!("expected crossing");
        };
        assert_eq!((c.col_h(), c.row_v()), (60, 60));
        assert_eq!(c.run.ticks, 200);
    }

    #[test]
    fn global_options_after_subcommand() {
        let args = CliArgs::parse_from(["laneflow", "corridor", "--seed", "9", "-vv"]);
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn report_line_format() {
        let report = TickReport {
            tick: 40,
            roads: vec![RoadReport {
                moved: 12,
                occupied: 30,
                live: 30,
                ..Default::default()
            }],
            signals: SignalReport::Lights(vec![LightColor::Green, LightColor::Red]),
            workers: 2,
        };
        assert_eq!(
            format_report(&report),
            "Iter 40 | moved=12 | occ=30 | light0=Green | threads=2"
        );
    }
}
