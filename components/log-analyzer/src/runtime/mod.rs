//! Orchestration of a full analyzer run.

/// Settings and the analyzer run loop.
pub mod runtime;
