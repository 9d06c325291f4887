//! Per-tick timing instrumentation.
//!
//! [`TickProfile`] captures phase timing from the most recent tick. The
//! orchestrators only fill it in when the `profiling` feature is enabled.

use std::time::Duration;

/// Per-phase timing from the most recent tick.
#[derive(Debug, Clone, Default)]
pub struct TickProfile {
    /// Freezing gates, stepping controllers and running the flow passes.
    pub signals_and_flow: Duration,
    /// Counting occupancy and building the report.
    pub metrics: Duration,
    pub total: Duration,
    pub tick: u64,
}

impl TickProfile {
    /// Returns the name and duration of the slowest phase.
    pub fn bottleneck_phase(&self) -> (&'static str, Duration) {
        if self.metrics > self.signals_and_flow {
            ("metrics", self.metrics)
        } else {
            ("signals_and_flow", self.signals_and_flow)
        }
    }
}
