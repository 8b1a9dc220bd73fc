//! Configuration, input sources, line ingestion and shutdown.

/// Files and stdin as line sources.
pub mod input;
/// Optional TOML configuration.
pub mod load_config;
/// Line ingestion loop.
pub mod log_processing;
/// Ctrl-C driven cancellation.
pub mod shutdown;
