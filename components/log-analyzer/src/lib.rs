//! Solr request log analyzer.
//!
//! Lines are matched by [`parser::parser::LogRecord::parse`], accumulated per
//! core by [`stats::aggregator::StatisticsAggregator`] and rendered by
//! [`report::render`]. The `cli`, `helpers`, `instrumentation` and `runtime`
//! modules drive it as a command line tool.

pub mod cli;
pub mod helpers;
pub mod instrumentation;
pub mod parser;
pub mod report;
pub mod runtime;
pub mod stats;
