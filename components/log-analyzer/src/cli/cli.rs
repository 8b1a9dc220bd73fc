use crate::helpers::load_config::Config;
use crate::instrumentation;
use crate::report::render::OutputFormat;
use crate::runtime::{self, runtime::Settings};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "solr-log-analyzer",
    long_about = "Reads Solr request logs and reports, per core, the busiest endpoints, the most \
                  frequent and the slowest search queries, and query time percentiles.",
    about = "Per-core statistics for Solr request logs",
    version,
    term_width = 100,
    after_help = "\
    EXAMPLES:
        solr-log-analyzer --max 20 /var/log/solr/solr.log
        zcat solr.log.gz | solr-log-analyzer --format json
        solr-log-analyzer --config ./log_analyzer.toml --parallel a.log b.log"
)]
struct Cli {
    /// Log files to read, in order. Standard input is read when none are given.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Number of entries in each top list [default: 10]
    #[arg(long, value_name = "N")]
    max: Option<usize>,

    /// Echo lines that do not match to stderr
    #[arg(long)]
    debug: bool,

    /// TOML configuration file; command line flags take precedence
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Report format [default: text]
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Read each file on its own task and merge the results in file order
    #[arg(long)]
    parallel: bool,

    /// Also write JSON logs to a file in this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

impl Cli {
    /// Merge flags over the configuration file, if any.
    fn settings(&self) -> Result<Settings> {
        let cfg = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        Ok(Settings {
            files: self.files.clone(),
            max: self.max.unwrap_or(cfg.report.max),
            debug: self.debug || cfg.parser.debug,
            format: self.format.unwrap_or(cfg.report.format),
            parallel: self.parallel || cfg.runtime.parallel,
        })
    }
}

/// Entry function for CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Installed before the config is read so load failures are logged.
    let logging = instrumentation::tracing::init_tracing(cli.debug, cli.log_dir.as_deref())?;
    instrumentation::tracing::init_panic_handler();

    let settings = cli.settings()?;
    if settings.debug && !cli.debug {
        logging.enable_debug()?;
    }

    tracing::debug!(?settings, "Starting log analyzer");
    runtime::runtime::run_log_analyzer(settings).await
}
