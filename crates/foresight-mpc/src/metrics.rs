//! Per-call metrics for the planner.
//!
//! [`PlanMetrics`] captures timing and selection data for one `plan()`
//! call. It is telemetry only; planning never reads it back.

/// Timing and selection metrics from a single planning call.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlanMetrics {
    /// Wall-clock time for the whole call, in microseconds.
    pub total_us: u64,
    /// Time spent sampling candidates, in microseconds.
    pub sample_us: u64,
    /// Rollout time per ensemble member, in member order.
    pub member_us: Vec<u64>,
    /// The call took the cold-start path (no statistics yet).
    pub cold_start: bool,
    /// Index of the selected candidate. `None` on cold start.
    pub best_index: Option<usize>,
    /// Ensemble-mean return of the selected candidate. `None` on cold start.
    pub best_return: Option<f32>,
}

pub(crate) fn elapsed_us(start: std::time::Instant) -> u64 {
    start.elapsed().as_micros().try_into().unwrap_or(u64::MAX)
}
