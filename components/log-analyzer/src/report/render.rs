// Local crates
use crate::report::models::{CoreReport, RankedEntry, Report};

// External crates
use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;

const RULE_WIDTH: usize = 40;
const CORE_SEPARATOR_WIDTH: usize = 100;

/// How the final report is written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable sections per core.
    #[default]
    Text,
    /// The whole report as one JSON document.
    Json,
}

impl OutputFormat {
    /// Render `report` in this format.
    pub fn render(self, report: &Report) -> serde_json::Result<String> {
        match self {
            OutputFormat::Text => Ok(TextReport(report).to_string()),
            OutputFormat::Json => serde_json::to_string_pretty(report),
        }
    }
}

/// Plain-text rendering of a [`Report`].
#[derive(Debug)]
pub struct TextReport<'a>(pub &'a Report);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for core in &self.0.cores {
            write_core(f, core)?;
            writeln!(f, "{}", "*".repeat(CORE_SEPARATOR_WIDTH))?;
            writeln!(f)?;
        }

        writeln!(
            f,
            "parsed {} lines with {} queries",
            self.0.total_lines, self.0.total_queries
        )
    }
}

fn write_core(f: &mut fmt::Formatter<'_>, core: &CoreReport) -> fmt::Result {
    let name = &core.core;

    write_top_n(f, &format!("Top Endpoints for {name}"), &core.top_endpoints, "times")?;
    write_top_n(f, &format!("Top Search URLs for {name}"), &core.top_queries, "times")?;
    write_top_n(f, &format!("Slowest Searches for {name}"), &core.slowest_queries, "ms")?;
    write_top_n(
        f,
        &format!("Average Search Time for {name}"),
        &core.average_query_times,
        "ms",
    )?;

    write_title(f, &format!("Search Time for {name}"))?;
    writeln!(f)?;
    match &core.percentiles {
        Some(percentiles) => {
            for (label, value) in percentiles.labelled() {
                writeln!(f, "{label:<10} {value}ms")?;
            }
        }
        None => writeln!(f, "no data")?,
    }
    writeln!(f)?;

    write_title(f, &format!("Summary for {name}"))?;
    writeln!(f, "{:<10} {}", "Lines", core.lines)?;
    if core.hits_lines > 0 {
        writeln!(f, "{:<10} {} over {} lines", "Hits", core.hits_total, core.hits_lines)?;
    }
    if let Some(range) = &core.time_range {
        writeln!(f, "{:<10} {} .. {}", "Seen", range.first, range.last)?;
    }
    writeln!(f)
}

fn write_title(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "=".repeat(RULE_WIDTH))
}

fn write_top_n(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    entries: &[RankedEntry],
    unit: &str,
) -> fmt::Result {
    write_title(f, title)?;
    for (index, entry) in entries.iter().enumerate() {
        writeln!(f, "QUERY {}: \"{}\" {} {unit}", index + 1, entry.label, entry.value)?;
        writeln!(f)?;
    }
    writeln!(f)
}
