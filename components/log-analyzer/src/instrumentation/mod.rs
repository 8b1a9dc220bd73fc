//! Tracing subscriber and panic hook setup.

/// Subscriber installation.
pub mod tracing;
