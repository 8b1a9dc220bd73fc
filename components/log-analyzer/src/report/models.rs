// External crates
use chrono::NaiveDateTime;
use serde::Serialize;

/// One row of a top-N view: the key (endpoint path or raw query string)
/// and the value it was ranked by (count or milliseconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    /// Endpoint path or raw query string.
    pub label: String,
    /// Count or milliseconds, depending on the view.
    pub value: u64,
}

/// Latency percentiles in milliseconds, one sample per distinct query
/// string (its most recent QTime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Percentiles {
    /// 50th percentile.
    pub median: u64,
    /// 75th percentile.
    pub p75: u64,
    /// 90th percentile.
    pub p90: u64,
    /// 99th percentile.
    pub p99: u64,
}

impl Percentiles {
    /// Labelled values in display order.
    pub fn labelled(&self) -> [(&'static str, u64); 4] {
        [
            ("Median", self.median),
            ("75%", self.p75),
            ("90%", self.p90),
            ("99%", self.p99),
        ]
    }
}

/// Earliest and latest timestamps seen for a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    /// Earliest timestamp.
    pub first: NaiveDateTime,
    /// Latest timestamp.
    pub last: NaiveDateTime,
}

/// Finalized statistics for one core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreReport {
    /// Core name.
    pub core: String,
    /// Matched lines for this core.
    pub lines: u64,
    /// Endpoints by request count.
    pub top_endpoints: Vec<RankedEntry>,
    /// Query strings by occurrence count.
    pub top_queries: Vec<RankedEntry>,
    /// Ranked by the last seen QTime of each query string, not its maximum.
    pub slowest_queries: Vec<RankedEntry>,
    /// Mean QTime per query string, whole milliseconds.
    pub average_query_times: Vec<RankedEntry>,
    /// `None` when the core has no queries.
    pub percentiles: Option<Percentiles>,
    /// Sum of every reported hit count.
    pub hits_total: u64,
    /// Lines that carried a usable hit count.
    pub hits_lines: u64,
    /// `None` when no line for this core had a timestamp.
    pub time_range: Option<TimeRange>,
}

/// Reports for every core plus the run totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Sorted by core name.
    pub cores: Vec<CoreReport>,
    /// Every line read, matched or not.
    pub total_lines: u64,
    /// Lines that matched, across all cores.
    pub total_queries: u64,
}
