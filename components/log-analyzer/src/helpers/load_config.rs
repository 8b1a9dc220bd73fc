// Local crates
use crate::report::render::OutputFormat;

// External crates
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::instrument;

/// Default length of every top-N list.
pub const DEFAULT_TOP_N: usize = 10;

/// Optional TOML configuration. Every section and key may be omitted,
/// command line flags take precedence over anything set here.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// `[report]` section.
    pub report: ReportConfig,
    /// `[parser]` section.
    pub parser: ParserConfig,
    /// `[runtime]` section.
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Load and parse the configuration file
    #[instrument(
        name = "config_loader",
        target = "helpers::load_config",
        level = "trace",
        skip_all
    )]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        tracing::trace!(
            configuration_file_path = %path_ref.display(),
            "Loading log analyzer configuration file"
        );

        let config_str = match fs::read_to_string(path_ref) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read configuration file");
                return Err(e)
                    .with_context(|| format!("Failed to read config file at {:?}", path_ref));
            }
        };
        let config: Config = match toml::from_str(&config_str) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse TOML configuration");
                return Err(e)
                    .with_context(|| format!("Failed to parse TOML from {:?}", path_ref));
            }
        };

        tracing::trace!(configuration_file_path = %path_ref.display(), "Configuration file loaded successfully");
        Ok(config)
    }
}

/// `[report]` section.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    /// Length of the endpoint, query and slowest-query lists.
    pub max: usize,
    /// Report format when `--format` is not given.
    pub format: OutputFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max: DEFAULT_TOP_N,
            format: OutputFormat::default(),
        }
    }
}

/// `[parser]` section.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ParserConfig {
    /// Echo lines that do not match to the diagnostic log.
    pub debug: bool,
}

/// `[runtime]` section.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Ingest each named file on its own task.
    pub parallel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"").unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.report.max, DEFAULT_TOP_N);
        assert_eq!(cfg.report.format, OutputFormat::Text);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[report]\nformat = \"json\"\n\n[runtime]\nparallel = true").unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.report.max, DEFAULT_TOP_N);
        assert_eq!(cfg.report.format, OutputFormat::Json);
        assert!(!cfg.parser.debug);
        assert!(cfg.runtime.parallel);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.toml")).unwrap_err();

        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[report]\nmax = \"ten\"").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }
}
