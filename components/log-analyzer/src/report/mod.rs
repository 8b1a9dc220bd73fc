//! Report data and rendering.

/// Serializable report types.
pub mod models;
/// Text and JSON output.
pub mod render;
