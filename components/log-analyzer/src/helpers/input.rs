// External crates
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::instrument;

const READ_BUFFER_SIZE: usize = 16384;

/// Where log lines come from.
#[derive(Debug)]
pub enum InputSource {
    /// An already opened file, named on the command line.
    File {
        /// Path as given, used in progress lines and errors.
        path: PathBuf,
        /// Handle opened by [`InputSource::open_all`].
        file: File,
    },
    /// Standard input, used when no files are named.
    Stdin,
}

impl InputSource {
    /// Open every named file up front, or fall back to stdin when `paths`
    /// is empty. The first file that cannot be opened aborts the run, so
    /// nothing is aggregated from a partial set of inputs.
    #[instrument(
        name = "log_analyzer_input::open_all",
        target = "helpers::input",
        skip_all,
        level = "debug"
    )]
    pub async fn open_all(paths: &[PathBuf]) -> Result<Vec<InputSource>> {
        if paths.is_empty() {
            tracing::debug!("No input files given, reading standard input");
            return Ok(vec![InputSource::Stdin]);
        }

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            sources.push(Self::open(path).await?);
        }

        Ok(sources)
    }

    async fn open(path: &Path) -> Result<InputSource> {
        let file = match File::open(path).await {
            Ok(f) => f,
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Failed to open input file");
                return Err(e).with_context(|| format!("Failed to open log file {:?}", path));
            }
        };

        tracing::debug!(path = %path.display(), "Opened input file");
        Ok(InputSource::File {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Whether this source is a named file rather than stdin.
    pub fn is_file(&self) -> bool {
        matches!(self, InputSource::File { .. })
    }

    /// Buffered reader over the source's bytes.
    pub fn into_reader(self) -> Box<dyn AsyncBufRead + Send + Unpin> {
        match self {
            InputSource::File { file, .. } => {
                Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file))
            }
            InputSource::Stdin => {
                Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, tokio::io::stdin()))
            }
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::File { path, .. } => write!(f, "{}", path.display()),
            InputSource::Stdin => f.write_str("<stdin>"),
        }
    }
}
