//! Command line entry point.

/// Argument parsing and the `run` entry.
pub mod cli;
