//! End-to-end scenarios driven through the public orchestrators.

use laneflow_core::config::{CorridorConfig, CrossingConfig, RoadConfig};
use laneflow_core::corridor::Corridor;
use laneflow_core::crossing::{Crossing, Road};
use laneflow_core::engine::{Open, advance};
use laneflow_core::id::VehicleId;
use laneflow_core::intersection::{AxisTimings, IntersectionController, IntersectionTimings};
use laneflow_core::report::{ReportSchedule, SignalReport, TickReport};
use laneflow_core::signal::{LightBank, LightColor, LightTimings, TrafficLight};
use laneflow_core::test_utils::*;
use laneflow_core::workers::WorkerPolicy;

// ===========================================================================
// Single road
// ===========================================================================

#[test]
fn lone_vehicle_crosses_five_cells_then_exits() {
    let (population, grid) = road(1, 5, &[(0, 0)]);
    let mut corridor =
        Corridor::from_parts(population, grid, LightBank::default(), WorkerPolicy::Fixed(2))
            .unwrap();

    let mut trail = Vec::new();
    for _ in 0..4 {
        corridor.step().unwrap();
        trail.push(corridor.population.get(VehicleId(0)).unwrap().position);
    }
    assert_eq!(trail, vec![1, 2, 3, 4]);

    let report = corridor.step().unwrap();
    assert_eq!(report.roads[0].exited, 1);
    assert!(!corridor.population.get(VehicleId(0)).unwrap().alive);
    assert!(corridor.grid.lane_occupancy(0).iter().all(Option::is_none));
}

#[test]
fn red_light_holds_vehicle_for_its_duration() {
    let light = TrafficLight::new(
        3,
        LightTimings {
            red: 3,
            yellow: 1,
            green: 3,
        },
        LightColor::Red,
    );
    let (population, grid) = road(1, 8, &[(0, 2)]);
    let lights = LightBank::new(vec![light], 8).unwrap();
    let mut corridor =
        Corridor::from_parts(population, grid, lights, WorkerPolicy::Fixed(1)).unwrap();

    for _ in 0..3 {
        corridor.step().unwrap();
        assert_eq!(positions(&corridor.population), vec![Some(2)]);
    }
    assert_eq!(corridor.lights.colors(), vec![LightColor::Green]);

    corridor.step().unwrap();
    assert_eq!(positions(&corridor.population), vec![Some(3)]);
}

#[test]
fn queue_behind_red_light_compacts_then_drains() {
    let light = TrafficLight::new(
        6,
        LightTimings {
            red: 10,
            yellow: 1,
            green: 10,
        },
        LightColor::Red,
    );
    let (population, grid) = road(1, 12, &[(0, 0), (0, 2), (0, 4)]);
    let lights = LightBank::new(vec![light], 12).unwrap();
    let mut corridor =
        Corridor::from_parts(population, grid, lights, WorkerPolicy::Fixed(2)).unwrap();

    for _ in 0..5 {
        corridor.step().unwrap();
    }
    // Bumper to bumper in front of the light.
    assert_eq!(positions(&corridor.population), vec![Some(3), Some(4), Some(5)]);

    for _ in 0..30 {
        corridor.step().unwrap();
    }
    assert_eq!(corridor.population.live_count(), 0);
    assert_eq!(corridor.grid.occupied_count(), 0);
}

#[test]
fn seeding_shortfall_is_counted() {
    let config = CorridorConfig {
        road: RoadConfig {
            lanes: 1,
            length: 10,
            vehicles: Some(25),
        },
        lights: 0,
        ..Default::default()
    };
    let corridor = Corridor::new(&config).unwrap();
    assert_eq!(corridor.population.len(), 25);
    assert!(corridor.dead_on_arrival() >= 15);
    assert_eq!(
        corridor.population.live_count(),
        25 - corridor.dead_on_arrival()
    );
    assert_consistent(&corridor.population, &corridor.grid);
}

#[test]
fn occupancy_is_independent_of_worker_count() {
    let hash_with = |max_workers: usize| {
        let mut config = CorridorConfig::default();
        config.road.lanes = 6;
        config.road.length = 400;
        config.run.seed = 77;
        config.run.max_workers = Some(max_workers);
        let mut corridor = Corridor::new(&config).unwrap();
        let mut hashes = Vec::new();
        for _ in 0..150 {
            corridor.step().unwrap();
            hashes.push(corridor.occupancy_hash());
        }
        hashes
    };
    assert_eq!(hash_with(1), hash_with(8));
}

#[test]
fn run_reports_every_interval() {
    let mut corridor = Corridor::new(&CorridorConfig::default()).unwrap();
    let mut sink: Vec<TickReport> = Vec::new();
    corridor.run(200, ReportSchedule::default(), &mut sink).unwrap();
    assert_eq!(sink.len(), 10);
    assert_eq!(sink.last().unwrap().tick, 200);
    for report in &sink {
        assert!(matches!(&report.signals, SignalReport::Lights(c) if c.len() == 2));
        assert_eq!(report.contended(), 0);
    }
}

#[test]
fn parallel_pass_matches_serial_reference() {
    let (mut pop_a, mut grid_a) = striped_road(5, 300, 3);
    let (mut pop_b, mut grid_b) = striped_road(5, 300, 3);
    for _ in 0..320 {
        let a = advance(&mut pop_a, &mut grid_a, &Open);
        let b = advance_serial(&mut pop_b, &mut grid_b, &Open);
        assert_eq!(a, b);
        assert_eq!(positions(&pop_a), positions(&pop_b));
    }
    assert_eq!(pop_a.live_count(), 0);
}

// ===========================================================================
// Intersection
// ===========================================================================

fn single_vehicle_road(length: usize, position: usize) -> Road {
    let (population, grid) = road(1, length, &[(0, position)]);
    Road { population, grid }
}

#[test]
fn axes_take_turns_through_the_intersection() {
    let axis = AxisTimings {
        green: 4,
        yellow: 1,
    };
    let controller = IntersectionController::new(IntersectionTimings { ns: axis, ew: axis }).unwrap();
    let mut crossing = Crossing::from_parts(
        single_vehicle_road(12, 5),
        single_vehicle_road(12, 5),
        controller,
        6,
        6,
        WorkerPolicy::Fixed(3),
    )
    .unwrap();

    // Vertical goes first; horizontal waits through NS green + NS yellow.
    crossing.step().unwrap();
    assert_eq!(positions(&crossing.vertical.population), vec![Some(6)]);
    for _ in 0..4 {
        crossing.step().unwrap();
        assert_eq!(positions(&crossing.horizontal.population), vec![Some(5)]);
    }
    crossing.step().unwrap();
    assert_eq!(positions(&crossing.horizontal.population), vec![Some(6)]);
}

#[test]
fn crossing_occupancy_is_independent_of_worker_count() {
    let hash_with = |max_workers: usize| {
        let mut config = CrossingConfig {
            horizontal: RoadConfig {
                lanes: 5,
                length: 300,
                vehicles: None,
            },
            vertical: RoadConfig {
                lanes: 3,
                length: 200,
                vehicles: None,
            },
            ..Default::default()
        };
        config.run.seed = 31;
        config.run.max_workers = Some(max_workers);
        let mut crossing = Crossing::new(&config).unwrap();
        let mut hashes = Vec::new();
        for _ in 0..150 {
            crossing.step().unwrap();
            hashes.push(crossing.occupancy_hash());
        }
        hashes
    };
    assert_eq!(hash_with(1), hash_with(8));
}

#[test]
fn seeded_crossing_stays_consistent() {
    let config = CrossingConfig {
        horizontal: RoadConfig {
            lanes: 4,
            length: 90,
            vehicles: Some(120),
        },
        vertical: RoadConfig {
            lanes: 2,
            length: 50,
            vehicles: None,
        },
        ..Default::default()
    };
    let mut crossing = Crossing::new(&config).unwrap();
    for _ in 0..120 {
        let report = crossing.step().unwrap();
        assert_consistent(&crossing.horizontal.population, &crossing.horizontal.grid);
        assert_consistent(&crossing.vertical.population, &crossing.vertical.grid);
        assert_eq!(report.contended(), 0);
        let SignalReport::Intersection { ns, ew, .. } = report.signals else {
            panic!("crossing must report intersection state");
        };
        assert!(!(ns == LightColor::Green && ew == LightColor::Green));
    }
}
