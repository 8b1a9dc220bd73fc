//! Per-core accumulation.

/// Run-wide aggregation over all cores.
pub mod aggregator;
/// Statistics for one core.
pub mod core_stats;
