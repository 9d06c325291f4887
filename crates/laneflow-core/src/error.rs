use std::path::PathBuf;

/// Errors raised while validating or loading a scenario configuration.
///
/// All geometry problems are caught here, at construction, never at tick
/// time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A road needs at least one lane and one cell per lane.
    #[error("road must have at least one lane and one cell, got {lanes}x{length}")]
    EmptyRoad { lanes: usize, length: usize },

    /// The cell count `lanes * length` must fit in a `usize`.
    #[error("road of {lanes}x{length} cells is too large")]
    RoadTooLarge { lanes: usize, length: usize },

    /// A gate cell must lie strictly inside the segment: `[1, length - 2]`.
    #[error("gate cell {cell} outside [1, {max}] on a segment of length {length}")]
    GateOutOfRange { cell: usize, max: usize, length: usize },

    /// Every signal state must last at least one tick.
    #[error("signal duration for {state} must be at least 1 tick")]
    ZeroDuration { state: &'static str },

    /// Vehicle ids must fit below the empty-cell sentinel.
    #[error("vehicle count {count} exceeds the maximum of {max}")]
    TooManyVehicles { count: usize, max: usize },

    /// Reports are emitted every `n` ticks; `n` must be positive.
    #[error("report interval must be at least 1 tick")]
    ZeroReportInterval,

    /// A worker cap of zero would leave no thread to run the tick.
    #[error("max_workers must be at least 1")]
    ZeroWorkers,

    /// The config file has an extension we don't support.
    #[error("unsupported config format: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the tick orchestrators.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The worker pool for a tick could not be started.
    #[error("failed to build worker pool with {workers} threads: {source}")]
    WorkerPool {
        workers: usize,
        source: rayon::ThreadPoolBuildError,
    },
}
