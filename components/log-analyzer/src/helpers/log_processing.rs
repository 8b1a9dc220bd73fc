// Local crates
use crate::stats::aggregator::StatisticsAggregator;

// External crates
use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// How a single source's ingestion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    /// Reached end of input.
    Complete {
        /// Lines handed to the aggregator.
        lines: u64,
    },
    /// Cancelled between two lines.
    Interrupted {
        /// Lines handed to the aggregator before cancellation.
        lines: u64,
    },
}

impl Ingested {
    /// Lines read from the source, however ingestion ended.
    pub fn lines(self) -> u64 {
        match self {
            Ingested::Complete { lines } | Ingested::Interrupted { lines } => lines,
        }
    }
}

/// Read `reader` line by line into `aggregator` until end of input or
/// until `cancel` fires.
///
/// Bytes that are not valid UTF-8 are replaced rather than failing the
/// run, and a trailing `\n` or `\r\n` is stripped. A line cut short by
/// cancellation is discarded, never half-applied.
#[instrument(
    name = "log_analyzer_pipeline::ingest",
    target = "helpers::log_processing",
    skip_all,
    fields(source = %source_name),
    level = "debug"
)]
pub async fn ingest<R>(
    mut reader: R,
    source_name: &str,
    aggregator: &mut StatisticsAggregator,
    cancel: &CancellationToken,
) -> Result<Ingested>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut lines = 0u64;

    loop {
        buf.clear();

        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(lines, "Ingestion cancelled");
                return Ok(Ingested::Interrupted { lines });
            }
            read = reader.read_until(b'\n', &mut buf) => read,
        };

        let n = read.with_context(|| format!("Failed to read from {source_name}"))?;
        if n == 0 {
            break;
        }

        let line = String::from_utf8_lossy(strip_line_ending(&buf));
        aggregator.process_line(&line);
        lines += 1;
    }

    tracing::debug!(lines, "Reached end of input");
    Ok(Ingested::Complete { lines })
}

fn strip_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
