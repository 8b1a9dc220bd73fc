// Local crates
use crate::{
    helpers::{
        input::InputSource,
        log_processing::{Ingested, ingest},
        shutdown::Shutdown,
    },
    report::render::OutputFormat,
    stats::aggregator::StatisticsAggregator,
};

// External crates
use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Fully resolved run options (command line over config file over
/// defaults).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Files to read in order, stdin when empty.
    pub files: Vec<PathBuf>,
    /// Length of every top-N list.
    pub max: usize,
    /// Echo unmatched lines to the diagnostic log.
    pub debug: bool,
    /// Report format written to stdout.
    pub format: OutputFormat,
    /// Ingest files on separate tasks and merge in file order.
    pub parallel: bool,
}

/// Log analyzer runtime: ingest every source, then render the report to
/// stdout.
#[instrument(
    name = "log_analyzer_runtime::run",
    target = "runtime::runtime",
    skip_all,
    level = "debug"
)]
pub async fn run_log_analyzer(settings: Settings) -> Result<()> {
    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();

    let mut stdout = std::io::stdout();
    let aggregator = analyze(&settings, &shutdown, &mut stdout).await?;

    // Let the Ctrl-C listener task exit.
    shutdown.trigger();

    let report = aggregator.report_all(settings.max);
    let rendered = settings
        .format
        .render(&report)
        .context("Failed to render report")?;

    stdout
        .write_all(rendered.as_bytes())
        .and_then(|()| stdout.flush())
        .context("Failed to write report to stdout")?;

    info!(
        total_lines = report.total_lines,
        total_queries = report.total_queries,
        cores = report.cores.len(),
        "Report written"
    );
    Ok(())
}

/// Open all sources and aggregate them. In text mode a `parsing <file>`
/// line is written to `progress` for each named file.
pub async fn analyze<W: Write>(
    settings: &Settings,
    shutdown: &Shutdown,
    progress: &mut W,
) -> Result<StatisticsAggregator> {
    let sources = InputSource::open_all(&settings.files).await?;
    let announce = settings.format == OutputFormat::Text;

    if settings.parallel && sources.len() > 1 {
        if announce {
            for source in &sources {
                writeln!(progress, "parsing {source}")?;
            }
        }
        return analyze_parallel(sources, shutdown).await;
    }

    let mut aggregator = StatisticsAggregator::new();
    for source in sources {
        if shutdown.is_triggered() {
            break;
        }
        if announce && source.is_file() {
            writeln!(progress, "parsing {source}")?;
        }

        let name = source.to_string();
        let outcome = ingest(source.into_reader(), &name, &mut aggregator, &shutdown.token()).await?;
        log_outcome(&name, outcome);
    }

    Ok(aggregator)
}

/// Each source gets its own aggregator on its own task. Results are
/// merged in source order so last-write-wins fields end up exactly as a
/// sequential run would leave them.
async fn analyze_parallel(
    sources: Vec<InputSource>,
    shutdown: &Shutdown,
) -> Result<StatisticsAggregator> {
    let tasks = sources.into_iter().map(|source| {
        let cancel = shutdown.token();
        tokio::spawn(async move {
            let name = source.to_string();
            let mut aggregator = StatisticsAggregator::new();
            let outcome = ingest(source.into_reader(), &name, &mut aggregator, &cancel).await?;
            log_outcome(&name, outcome);
            anyhow::Ok(aggregator)
        })
    });

    let results = futures::future::try_join_all(tasks)
        .await
        .context("Ingestion task failed")?;

    let mut merged = StatisticsAggregator::new();
    for result in results {
        merged.merge(result?);
    }

    Ok(merged)
}

fn log_outcome(source: &str, outcome: Ingested) {
    let lines = outcome.lines();
    match outcome {
        Ingested::Complete { .. } => {
            tracing::debug!(source, lines, "Finished reading source");
        }
        Ingested::Interrupted { .. } => {
            tracing::warn!(source, lines, "Stopped reading source early");
        }
    }
}
