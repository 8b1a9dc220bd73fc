// Local crates
use crate::parser::parser::LogRecord;
use crate::report::models::{CoreReport, Percentiles, RankedEntry, TimeRange};

// External crates
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Occurrence count of an endpoint, plus the line sequence number it was
/// first seen at (used to break ranking ties).
#[derive(Debug, Clone, Copy)]
struct Tally {
    count: u64,
    first_seen: u64,
}

/// Everything tracked per distinct query string. Keeping count and
/// timings in one entry means a query never has a time without a count.
#[derive(Debug, Clone, Copy)]
struct QueryTally {
    count: u64,
    first_seen: u64,
    /// QTime of the most recent occurrence, overwritten on every line.
    last_time_ms: u64,
    total_time_ms: u64,
}

/// Accumulated statistics for a single Solr core.
#[derive(Debug, Clone)]
pub struct CoreStatistics {
    name: String,
    endpoints: HashMap<String, Tally>,
    queries: HashMap<String, QueryTally>,
    line_count: u64,
    hits_total: u64,
    hits_lines: u64,
    earliest: Option<NaiveDateTime>,
    latest: Option<NaiveDateTime>,
}

impl CoreStatistics {
    /// Empty statistics for the core called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoints: HashMap::new(),
            queries: HashMap::new(),
            line_count: 0,
            hits_total: 0,
            hits_lines: 0,
            earliest: None,
            latest: None,
        }
    }

    /// Apply one matched line to this core.
    ///
    /// The query's last time is replaced, not maxed or summed, so
    /// slowest-query and percentile views reflect the latest sample only.
    pub fn record(&mut self, record: LogRecord) {
        let seq = self.line_count;

        self.endpoints
            .entry(record.path)
            .or_insert(Tally {
                count: 0,
                first_seen: seq,
            })
            .count += 1;

        let query = self.queries.entry(record.search_params).or_insert(QueryTally {
            count: 0,
            first_seen: seq,
            last_time_ms: 0,
            total_time_ms: 0,
        });
        query.count += 1;
        query.last_time_ms = record.query_time_ms;
        query.total_time_ms = query.total_time_ms.saturating_add(record.query_time_ms);

        if let Some(hits) = record.hits {
            self.hits_total = self.hits_total.saturating_add(hits);
            self.hits_lines += 1;
        }

        if let Some(ts) = record.timestamp {
            self.earliest = min_opt(self.earliest, Some(ts));
            self.latest = max_opt(self.latest, Some(ts));
        }

        self.line_count += 1;
    }

    /// Fold statistics gathered from a later slice of input into this one.
    ///
    /// Produces the same state as recording `self`'s lines followed by
    /// `later`'s lines on a single accumulator.
    pub fn merge(&mut self, later: CoreStatistics) {
        let offset = self.line_count;

        for (path, tally) in later.endpoints {
            self.endpoints
                .entry(path)
                .or_insert(Tally {
                    count: 0,
                    first_seen: offset + tally.first_seen,
                })
                .count += tally.count;
        }

        for (params, tally) in later.queries {
            match self.queries.entry(params) {
                Entry::Occupied(mut existing) => {
                    let existing = existing.get_mut();
                    existing.count += tally.count;
                    existing.last_time_ms = tally.last_time_ms;
                    existing.total_time_ms =
                        existing.total_time_ms.saturating_add(tally.total_time_ms);
                }
                Entry::Vacant(slot) => {
                    slot.insert(QueryTally {
                        first_seen: offset + tally.first_seen,
                        ..tally
                    });
                }
            }
        }

        self.line_count += later.line_count;
        self.hits_total = self.hits_total.saturating_add(later.hits_total);
        self.hits_lines += later.hits_lines;
        self.earliest = min_opt(self.earliest, later.earliest);
        self.latest = max_opt(self.latest, later.latest);
    }

    /// Core name as it appeared between the brackets.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Matched lines attributed to this core.
    pub fn line_count(&self) -> u64 {
        self.line_count
    }

    /// Occurrences of the endpoint `path`, zero if never seen.
    pub fn endpoint_count(&self, path: &str) -> u64 {
        self.endpoints.get(path).map_or(0, |t| t.count)
    }

    /// Occurrences of exactly these params, zero if never seen.
    pub fn query_count(&self, params: &str) -> u64 {
        self.queries.get(params).map_or(0, |q| q.count)
    }

    /// QTime of the most recent line carrying exactly these params.
    pub fn query_time_last(&self, params: &str) -> Option<u64> {
        self.queries.get(params).map(|q| q.last_time_ms)
    }

    /// Number of distinct query strings.
    pub fn distinct_queries(&self) -> usize {
        self.queries.len()
    }

    /// Most requested endpoints, by count.
    pub fn top_endpoints(&self, n: usize) -> Vec<RankedEntry> {
        rank(
            self.endpoints.iter().map(|(k, t)| (k, t.count, t.first_seen)),
            n,
        )
    }

    /// Most frequent query strings, by count.
    pub fn top_queries(&self, n: usize) -> Vec<RankedEntry> {
        rank(
            self.queries.iter().map(|(k, q)| (k, q.count, q.first_seen)),
            n,
        )
    }

    /// Query strings by their most recent QTime.
    pub fn slowest_queries(&self, n: usize) -> Vec<RankedEntry> {
        rank(
            self.queries
                .iter()
                .map(|(k, q)| (k, q.last_time_ms, q.first_seen)),
            n,
        )
    }

    /// Query strings by mean QTime over all their occurrences.
    pub fn average_query_times(&self, n: usize) -> Vec<RankedEntry> {
        rank(
            self.queries.iter().map(|(k, q)| {
                let mean = q.total_time_ms.checked_div(q.count).unwrap_or(0);
                (k, mean, q.first_seen)
            }),
            n,
        )
    }

    /// Median/75/90/99 over the last QTime of each distinct query.
    ///
    /// Index for percentile `p` is `floor(p * n / 100)` into the ascending
    /// samples, clamped to `n - 1`. Returns `None` for a core without
    /// queries.
    pub fn percentiles(&self) -> Option<Percentiles> {
        let mut samples: Vec<u64> = self.queries.values().map(|q| q.last_time_ms).collect();
        samples.sort_unstable();

        let n = samples.len();
        let last = n.checked_sub(1)?;
        let at = |pct: usize| samples.get((n * pct / 100).min(last)).copied();

        Some(Percentiles {
            median: at(50)?,
            p75: at(75)?,
            p90: at(90)?,
            p99: at(99)?,
        })
    }

    /// First and last timestamp among this core's lines, when any had one.
    pub fn time_range(&self) -> Option<TimeRange> {
        match (self.earliest, self.latest) {
            (Some(first), Some(last)) => Some(TimeRange { first, last }),
            _ => None,
        }
    }

    /// Build the finalized report with every ranked view cut to `top_n`.
    pub fn report(&self, top_n: usize) -> CoreReport {
        CoreReport {
            core: self.name.clone(),
            lines: self.line_count,
            top_endpoints: self.top_endpoints(top_n),
            top_queries: self.top_queries(top_n),
            slowest_queries: self.slowest_queries(top_n),
            average_query_times: self.average_query_times(top_n),
            percentiles: self.percentiles(),
            hits_total: self.hits_total,
            hits_lines: self.hits_lines,
            time_range: self.time_range(),
        }
    }
}

/// Sort by value descending, then first-seen ascending, and keep `n`.
fn rank<'a>(entries: impl Iterator<Item = (&'a String, u64, u64)>, n: usize) -> Vec<RankedEntry> {
    let mut ranked: Vec<_> = entries.collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(n)
        .map(|(label, value, _)| RankedEntry {
            label: label.clone(),
            value,
        })
        .collect()
}

fn min_opt<T: Ord>(a: Option<T>, b: Option<T>) -> Option<T> {
    a.into_iter().chain(b).min()
}

fn max_opt<T: Ord>(a: Option<T>, b: Option<T>) -> Option<T> {
    a.into_iter().chain(b).max()
}
