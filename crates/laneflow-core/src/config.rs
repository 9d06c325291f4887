//! Scenario configuration: defaults, validation, and file loading.
//!
//! Configs can be built in code, from the command line, or loaded from a
//! RON, TOML, or JSON file (format picked by extension). Every geometry
//! check runs in [`validate`](CorridorConfig::validate), before any grid is
//! allocated.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::id::VehicleId;
use crate::intersection::IntersectionTimings;
use crate::signal::{LightTimings, check_gate};
use crate::workers::WorkerPolicy;

/// Default initial density: one vehicle per this many cells.
pub const DEFAULT_DENSITY_DIVISOR: usize = 6;

// ===========================================================================
// Roads
// ===========================================================================

/// Geometry and population of one road segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    pub lanes: usize,
    pub length: usize,
    /// Vehicles to seed. `None` means `lanes * length / 6`.
    pub vehicles: Option<usize>,
}

impl RoadConfig {
    pub fn vehicle_count(&self) -> usize {
        self.vehicles
            .unwrap_or(self.lanes.saturating_mul(self.length) / DEFAULT_DENSITY_DIVISOR)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lanes == 0 || self.length == 0 {
            return Err(ConfigError::EmptyRoad {
                lanes: self.lanes,
                length: self.length,
            });
        }
        if self.lanes.checked_mul(self.length).is_none() {
            return Err(ConfigError::RoadTooLarge {
                lanes: self.lanes,
                length: self.length,
            });
        }
        let count = self.vehicle_count();
        let max = VehicleId::MAX as usize;
        if count > max {
            return Err(ConfigError::TooManyVehicles { count, max });
        }
        Ok(())
    }
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            lanes: 3,
            length: 120,
            vehicles: None,
        }
    }
}

// ===========================================================================
// Run settings shared by both scenario kinds
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub ticks: u64,
    pub seed: u64,
    /// Report every this many ticks.
    pub report_every: u64,
    /// Cap on worker threads. `None` means the machine's parallelism.
    pub max_workers: Option<usize>,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report_every == 0 {
            return Err(ConfigError::ZeroReportInterval);
        }
        if self.max_workers == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    pub fn worker_policy(&self) -> WorkerPolicy {
        match self.max_workers {
            Some(max) => WorkerPolicy::capped(max),
            None => WorkerPolicy::default(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: 200,
            seed: 0,
            report_every: 20,
            max_workers: None,
        }
    }
}

// ===========================================================================
// Corridor: one road, a bank of independent lights
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorConfig {
    pub road: RoadConfig,
    /// Number of evenly spaced lights.
    pub lights: usize,
    pub timings: LightTimings,
    pub run: RunConfig,
}

impl CorridorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.road.validate()?;
        self.run.validate()?;
        if self.lights > 0 {
            self.timings.validate()?;
            let spacing = self.road.length / (self.lights + 1);
            for i in 0..self.lights {
                check_gate((i + 1) * spacing, self.road.length)?;
            }
        }
        Ok(())
    }
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            road: RoadConfig::default(),
            lights: 2,
            timings: LightTimings::default(),
            run: RunConfig::default(),
        }
    }
}

// ===========================================================================
// Crossing: two roads sharing one intersection controller
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossingConfig {
    /// East-west road.
    pub horizontal: RoadConfig,
    /// North-south road.
    pub vertical: RoadConfig,
    /// Intersection cell on the horizontal road. `None` means the middle.
    pub col_h: Option<usize>,
    /// Intersection cell on the vertical road. `None` means the middle.
    pub row_v: Option<usize>,
    pub timings: IntersectionTimings,
    pub run: RunConfig,
}

impl CrossingConfig {
    pub fn col_h(&self) -> usize {
        self.col_h.unwrap_or(self.horizontal.length / 2)
    }

    pub fn row_v(&self) -> usize {
        self.row_v.unwrap_or(self.vertical.length / 2)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.horizontal.validate()?;
        self.vertical.validate()?;
        self.run.validate()?;
        self.timings.validate()?;
        check_gate(self.col_h(), self.horizontal.length)?;
        check_gate(self.row_v(), self.vertical.length)?;
        Ok(())
    }
}

impl Default for CrossingConfig {
    fn default() -> Self {
        Self {
            horizontal: RoadConfig::default(),
            vertical: RoadConfig::default(),
            col_h: None,
            row_v: None,
            timings: IntersectionTimings::default(),
            run: RunConfig::default(),
        }
    }
}

// ===========================================================================
// Scenario files
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioConfig {
    Corridor(CorridorConfig),
    Crossing(CrossingConfig),
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ScenarioConfig::Corridor(c) => c.validate(),
            ScenarioConfig::Crossing(c) => c.validate(),
        }
    }

    pub fn run(&self) -> &RunConfig {
        match self {
            ScenarioConfig::Corridor(c) => &c.run,
            ScenarioConfig::Crossing(c) => &c.run,
        }
    }

    pub fn run_mut(&mut self) -> &mut RunConfig {
        match self {
            ScenarioConfig::Corridor(c) => &mut c.run,
            ScenarioConfig::Crossing(c) => &mut c.run,
        }
    }
}

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Parse config text in the given format.
pub fn parse_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    path: &Path,
) -> Result<T, ConfigError> {
    let parse_err = |detail: String| ConfigError::Parse {
        file: path.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}

/// Read, parse, and validate a scenario file.
pub fn load_config(path: &Path) -> Result<ScenarioConfig, ConfigError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let config: ScenarioConfig = parse_str(&content, format, path)?;
    config.validate()?;
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================
