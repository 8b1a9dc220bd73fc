// Local crates
use crate::parser::parser::LogRecord;
use crate::report::models::{CoreReport, Report};
use crate::stats::core_stats::CoreStatistics;

// External crates
use std::collections::HashMap;
use tracing::instrument;

/// Owns one [`CoreStatistics`] per core name seen in the input, and the
/// run-wide line and query totals.
///
/// Ingest everything first with [`StatisticsAggregator::process_line`] or
/// [`StatisticsAggregator::process_all`], then read with
/// [`StatisticsAggregator::report`] / [`StatisticsAggregator::report_all`].
#[derive(Debug, Default, Clone)]
pub struct StatisticsAggregator {
    cores: HashMap<String, CoreStatistics>,
    total_lines: u64,
    total_queries: u64,
}

impl StatisticsAggregator {
    /// Empty aggregator with no cores and zero totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one line and, when it is a Solr request line, attribute it
    /// to its core. Returns whether the line matched.
    pub fn process_line(&mut self, line: &str) -> bool {
        self.total_lines += 1;

        let record = match LogRecord::parse(line) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(
                    target: "unmatched",
                    line_number = self.total_lines,
                    reason = %e,
                    "not matched: >>>{line}<<<"
                );
                return false;
            }
        };

        self.total_queries += 1;
        self.cores
            .entry(record.core.clone())
            .or_insert_with_key(|core| CoreStatistics::new(core.as_str()))
            .record(record);

        true
    }

    /// Feed every line in order.
    #[instrument(
        name = "log_analyzer_aggregator::process_all",
        target = "stats::aggregator",
        skip_all,
        level = "debug"
    )]
    pub fn process_all<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.process_line(line.as_ref());
        }

        tracing::debug!(
            total_lines = self.total_lines,
            total_queries = self.total_queries,
            cores = self.cores.len(),
            "Finished processing lines"
        );
    }

    /// Combine with an aggregator built from input that comes after this
    /// one's. Last-write-wins fields take `later`'s values.
    pub fn merge(&mut self, later: StatisticsAggregator) {
        self.total_lines += later.total_lines;
        self.total_queries += later.total_queries;

        for (core, stats) in later.cores {
            match self.cores.get_mut(&core) {
                Some(existing) => existing.merge(stats),
                None => {
                    self.cores.insert(core, stats);
                }
            }
        }
    }

    /// Statistics for `name`, if any of its lines matched.
    pub fn core(&self, name: &str) -> Option<&CoreStatistics> {
        self.cores.get(name)
    }

    /// Core names, sorted.
    pub fn core_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.cores.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Every line seen, matched or not.
    pub fn total_lines(&self) -> u64 {
        self.total_lines
    }

    /// Lines that matched, across all cores.
    pub fn total_queries(&self) -> u64 {
        self.total_queries
    }

    /// Ranked views for one core, `None` if the core never appeared.
    pub fn report(&self, core: &str, top_n: usize) -> Option<CoreReport> {
        self.cores.get(core).map(|stats| stats.report(top_n))
    }

    /// Reports for all cores in name order, plus the run totals.
    pub fn report_all(&self, top_n: usize) -> Report {
        let cores = self
            .core_names()
            .into_iter()
            .filter_map(|name| self.report(name, top_n))
            .collect();

        Report {
            cores,
            total_lines: self.total_lines,
            total_queries: self.total_queries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::models::Percentiles;
    use pretty_assertions::assert_eq;

    const PLACES: &str = "INFO  - 2018-11-12 08:42:22.162; org.apache.solr.core.SolrCore; [places] webapp=/solr path=/select/ params={q=*&wt=json} hits=9830 status=0 QTime=11";

    fn line(core: &str, path: &str, params: &str, qtime: u64) -> String {
        format!("INFO: [{core}] webapp=/solr path={path} params={{{params}}} status=0 QTime={qtime}")
    }

    #[test]
    fn single_places_line() {
        let mut agg = StatisticsAggregator::new();
        assert!(agg.process_line(PLACES));

        let places = agg.core("places").unwrap();
        assert_eq!(places.endpoint_count("/select/"), 1);
        assert_eq!(places.query_count("q=*&wt=json"), 1);
        assert_eq!(places.query_time_last("q=*&wt=json"), Some(11));
        assert_eq!(places.line_count(), 1);

        let report = agg.report("places", 10).unwrap();
        assert_eq!(
            report.percentiles,
            Some(Percentiles {
                median: 11,
                p75: 11,
                p90: 11,
                p99: 11,
            })
        );
        assert_eq!(report.hits_total, 9830);
        assert_eq!(report.hits_lines, 1);
        assert!(report.time_range.is_some());
    }

    #[test]
    fn unusable_hits_still_count_the_query() {
        let mut agg = StatisticsAggregator::new();
        assert!(agg.process_line(
            "INFO: [c1] webapp=/solr path=/select params={q=a} hits=abc status=0 QTime=5"
        ));
        assert!(agg.process_line(
            "INFO: [c1] webapp=/solr path=/select params={q=a} hits=184467440737095516160 status=0 QTime=6"
        ));
        assert!(agg.process_line(
            "INFO: [c1] webapp=/solr path=/select params={q=a} hits=7 status=0 QTime=7"
        ));

        assert_eq!(agg.total_queries(), 3);
        let c1 = agg.core("c1").unwrap();
        assert_eq!(c1.query_count("q=a"), 3);
        assert_eq!(c1.query_time_last("q=a"), Some(7));

        let report = agg.report("c1", 10).unwrap();
        assert_eq!(report.hits_total, 7);
        assert_eq!(report.hits_lines, 1);
    }

    #[test]
    fn unmatched_line_only_counts_towards_total() {
        let mut agg = StatisticsAggregator::new();
        let truncated = "INFO: [places] webapp=/solr path=/select/ params={q=*} hits=3 status=0";

        assert!(!agg.process_line(truncated));
        assert_eq!(agg.total_lines(), 1);
        assert_eq!(agg.total_queries(), 0);
        assert!(agg.core_names().is_empty());
        assert!(agg.report_all(10).cores.is_empty());
    }

    #[test]
    fn repeated_query_keeps_latest_time() {
        let mut agg = StatisticsAggregator::new();
        agg.process_all([
            line("c1", "/select", "q=x", 900),
            line("c1", "/select", "q=x", 15),
        ]);

        let stats = agg.core("c1").unwrap();
        assert_eq!(stats.query_count("q=x"), 2);
        assert_eq!(stats.query_time_last("q=x"), Some(15));
        assert_eq!(agg.report("c1", 10).unwrap().slowest_queries[0].value, 15);
    }

    #[test]
    fn line_count_per_core_matches_attributed_lines() {
        let mut agg = StatisticsAggregator::new();
        let lines = vec![
            line("b", "/select", "q=1", 1),
            line("a", "/select", "q=1", 1),
            "garbage".to_owned(),
            line("b", "/mlt", "q=2", 1),
        ];
        agg.process_all(&lines);

        assert_eq!(agg.core("a").map(CoreStatistics::line_count), Some(1));
        assert_eq!(agg.core("b").map(CoreStatistics::line_count), Some(2));
        assert_eq!(agg.total_lines(), 4);
        assert_eq!(agg.total_queries(), 3);

        let report = agg.report_all(10);
        let names: Vec<&str> = report.cores.iter().map(|c| c.core.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn same_input_gives_same_report() {
        let lines: Vec<String> = (0..50)
            .map(|i| line(&format!("c{}", i % 3), "/select", &format!("q={}", i % 7), i))
            .collect();

        let mut first = StatisticsAggregator::new();
        let mut second = StatisticsAggregator::new();
        first.process_all(&lines);
        second.process_all(&lines);

        assert_eq!(first.report_all(5), second.report_all(5));
    }

    #[test]
    fn merge_equals_processing_concatenated_input() {
        let head: Vec<String> = (0..20)
            .map(|i| line(&format!("c{}", i % 2), "/select", &format!("q={}", i % 5), i))
            .collect();
        let tail: Vec<String> = (0..20)
            .map(|i| line(&format!("c{}", i % 3), "/mlt", &format!("q={}", i % 4), 100 - i))
            .chain(std::iter::once("not a solr line".to_owned()))
            .collect();

        let mut sequential = StatisticsAggregator::new();
        sequential.process_all(head.iter().chain(tail.iter()));

        let mut merged = StatisticsAggregator::new();
        merged.process_all(&head);
        let mut later = StatisticsAggregator::new();
        later.process_all(&tail);
        merged.merge(later);

        assert_eq!(merged.report_all(10), sequential.report_all(10));
    }
}
