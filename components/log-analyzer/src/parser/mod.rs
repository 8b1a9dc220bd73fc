//! Solr request line parsing.

/// Request line regex and record type.
pub mod parser;
