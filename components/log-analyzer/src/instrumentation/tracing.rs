use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::panic;
use std::path::Path;
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    filter::{Directive, EnvFilter},
    fmt,
    prelude::*,
    registry::Registry,
    reload,
};

const LOG_FILE_NAME: &str = "solr_log_analyzer.log";

/// Keeps the installed subscriber's file writer and level filter
/// reachable for the rest of the run.
#[derive(Debug)]
pub struct TracingHandle {
    _file_guard: Option<WorkerGuard>,
    filter: reload::Handle<EnvFilter, Registry>,
}

impl TracingHandle {
    /// Turn on the unmatched line echo after the subscriber is already
    /// installed, e.g. when only the config file asked for it.
    pub fn enable_debug(&self) -> Result<()> {
        self.filter
            .reload(level_filter(true))
            .context("Failed to enable debug logging")
    }
}

fn level_filter(debug: bool) -> EnvFilter {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if debug {
        for directive in ["unmatched=debug", "solr_log_analyzer=debug"] {
            if let Ok(directive) = directive.parse::<Directive>() {
                filter = filter.add_directive(directive);
            }
        }
    }
    filter
}

/// Install the global subscriber.
///
/// Human readable events go to stderr so they never mix with the report
/// on stdout. `RUST_LOG` overrides the default `warn` level; `debug`
/// additionally enables the `unmatched` target that echoes every line
/// the parser rejected. With `log_dir` set, events are also written as
/// JSON to a file there; keep the returned handle alive until exit so the
/// file writer is flushed.
pub fn init_tracing(debug: bool, log_dir: Option<&Path>) -> Result<TracingHandle> {
    let (filter, filter_handle) = reload::Layer::new(level_filter(debug));

    let stderr_layer = fmt::layer()
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let (json_layer, guard) = match log_dir {
        Some(dir) => {
            let file_appender = rolling::never(dir, LOG_FILE_NAME);
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(non_blocking_writer)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339());

            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(stderr_layer)
        .with(json_layer)
        .with(ErrorLayer::default());

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global tracing subscriber")?;

    Ok(TracingHandle {
        _file_guard: guard,
        filter: filter_handle,
    })
}

/// Route panics through tracing so they also land in the JSON log file.
pub fn init_panic_handler() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let msg = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("Unknown panic");

        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_owned());

        error!(
            message = %msg,
            location = %location,
            "Application panicked!"
        );

        default_hook(panic_info);
    }));
}
