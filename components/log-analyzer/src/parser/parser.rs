// External crates
use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Serialize;
use thiserror::Error;

lazy_static! {
    /// Solr request log line, e.g.
    ///
    /// ```text
    /// INFO  - 2018-11-12 08:42:22.162; org.apache.solr.core.SolrCore; [places] webapp=/solr path=/select/ params={q=*&wt=json} hits=9830 status=0 QTime=11
    /// INFO: [places] webapp=/solr path=/select/ params={q=*&wt=json} status=0 QTime=11
    /// ```
    ///
    /// `params` is captured lazily: the first `}` that is followed by the
    /// rest of the expected suffix closes it, so nested braces inside the
    /// query string survive.
    static ref SOLR_REQUEST_RE: Regex = Regex::new(
        r"INFO(?P<prefix>.*?)\[(?P<core>\w+)\]\s+webapp=/\w+\s+path=(?P<path>/[\w/]*)\s+params=\{(?P<params>.*?)\}\s+(?:hits=(?P<hits>\w+)\s+)?status=\w+\s+QTime=(?P<qtime>\d+)"
    )
    .unwrap_or_else(|e| unreachable!("request pattern is a literal: {e}"));

    static ref TIMESTAMP_RE: Regex = Regex::new(
        r"\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}(?:\.\d+)?"
    )
    .unwrap_or_else(|e| unreachable!("timestamp pattern is a literal: {e}"));
}

/// One matched Solr request line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// Core (index/collection) the request was served by.
    pub core: String,
    /// Endpoint path, e.g. `/select/` or `/mlt`.
    pub path: String,
    /// Raw query string between `params={` and `}`, not decoded.
    pub search_params: String,
    /// Number of hits, only when the line reports one.
    pub hits: Option<u64>,
    /// Server-side query time in milliseconds.
    pub query_time_ms: u64,
    /// Timestamp found between `INFO` and the core, if any.
    pub timestamp: Option<NaiveDateTime>,
}

/// Reasons a line did not produce a [`LogRecord`].
///
/// None of these are fatal, callers count the line and move on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The line is not a Solr request line.
    #[error("line is not a Solr request log line")]
    NoMatch,

    /// The QTime segment matched but overflowed.
    #[error("`{field}` value `{value}` does not fit in u64")]
    InvalidNumber {
        /// Segment name as written in the log.
        field: &'static str,
        /// Raw digits.
        value: String,
    },
}

impl LogRecord {
    /// Parse one raw log line.
    ///
    /// Returns [`ParseError::NoMatch`] for anything lacking the `INFO`
    /// marker, the `[core]`, `webapp=`, `path=`, `params={..}`, `status=`
    /// or `QTime=` segments.
    pub fn parse(line: &str) -> Result<LogRecord, ParseError> {
        let caps = SOLR_REQUEST_RE.captures(line).ok_or(ParseError::NoMatch)?;

        let hits = caps.name("hits").and_then(|m| parse_hits(m.as_str()));
        let query_time_ms = parse_u64("QTime", capture(&caps, "qtime"))?;

        Ok(LogRecord {
            core: capture(&caps, "core").to_owned(),
            path: capture(&caps, "path").to_owned(),
            search_params: capture(&caps, "params").to_owned(),
            hits,
            query_time_ms,
            timestamp: parse_timestamp(capture(&caps, "prefix")),
        })
    }
}

fn capture<'a>(caps: &Captures<'a>, name: &str) -> &'a str {
    caps.name(name).map_or("", |m| m.as_str())
}

fn parse_u64(field: &'static str, value: &str) -> Result<u64, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_owned(),
    })
}

/// A `hits` token that is not a `u64` leaves the line counted, just
/// without a hit count.
fn parse_hits(value: &str) -> Option<u64> {
    match value.parse() {
        Ok(hits) => Some(hits),
        Err(e) => {
            tracing::trace!(hits = %value, error = %e, "Ignoring non-numeric hits");
            None
        }
    }
}

/// Timestamps are informational only, an unparsable stamp is dropped
/// instead of rejecting the line.
fn parse_timestamp(prefix: &str) -> Option<NaiveDateTime> {
    let raw = TIMESTAMP_RE.find(prefix)?.as_str().replacen('T', " ", 1);

    match NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f") {
        Ok(ts) => Some(ts),
        Err(e) => {
            tracing::trace!(timestamp = %raw, error = %e, "Ignoring unparsable timestamp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use pretty_assertions::assert_eq;

    const PLACES: &str = "INFO  - 2018-11-12 08:42:22.162; org.apache.solr.core.SolrCore; [places] webapp=/solr path=/select/ params={q=*&wt=json} hits=9830 status=0 QTime=11";

    #[test]
    fn parses_full_line() {
        let record = LogRecord::parse(PLACES).unwrap();

        let expected_ts = NaiveDate::from_ymd_opt(2018, 11, 12)
            .unwrap()
            .and_hms_milli_opt(8, 42, 22, 162)
            .unwrap();
        assert_eq!(
            record,
            LogRecord {
                core: "places".to_owned(),
                path: "/select/".to_owned(),
                search_params: "q=*&wt=json".to_owned(),
                hits: Some(9830),
                query_time_ms: 11,
                timestamp: Some(expected_ts),
            }
        );
    }

    #[test]
    fn hits_absent_when_segment_missing() {
        let line = "INFO  2018-11-12 08:42:22.162; org.apache.solr.core.SolrCore; [arstechnicacogtree] webapp=/solr path=/mlt params={mlt.count=16&fl=link,title&q=link_aliases:http\\://arstechnica.com/a.ars&fq=pub_date:[NOW/DAY-14DAYS+TO+NOW/DAY%2B1DAY]&rows=16} status=0 QTime=2";
        let record = LogRecord::parse(line).unwrap();

        assert_eq!(record.core, "arstechnicacogtree");
        assert_eq!(record.path, "/mlt");
        assert_eq!(record.hits, None);
        assert_eq!(record.query_time_ms, 2);
        assert!(record.search_params.ends_with("&rows=16"));
        assert_eq!(record.timestamp.map(|ts| ts.second()), Some(22));
    }

    #[test]
    fn accepts_info_with_colon_and_no_timestamp() {
        let line = "INFO: [places] webapp=/solr path=/select/ params={pf=*&sort=geodist()+asc&q=*} hits=9830 status=0 QTime=11";
        let record = LogRecord::parse(line).unwrap();

        assert_eq!(record.core, "places");
        assert_eq!(record.search_params, "pf=*&sort=geodist()+asc&q=*");
        assert_eq!(record.timestamp, None);
    }

    #[test]
    fn params_may_contain_braces() {
        let line = "INFO: [c1] webapp=/solr path=/select params={q={!lucene}title:x&wt=json} status=0 QTime=5";
        let record = LogRecord::parse(line).unwrap();

        assert_eq!(record.search_params, "q={!lucene}title:x&wt=json");
    }

    #[test]
    fn missing_mandatory_segments_never_match() {
        let cases = [
            "INFO: [c1] webapp=/solr path=/select params={q=x} hits=1 status=0",
            "INFO: [c1] webapp=/solr path=/select params={q=x} hits=1 QTime=3",
            "INFO: c1 webapp=/solr path=/select params={q=x} status=0 QTime=3",
            "INFO: [c1] webapp=/solr path=/select params={q=x status=0 QTime=3",
            "INFO: [c1] webapp=/solr params={q=x} status=0 QTime=3",
            "WARN: [c1] webapp=/solr path=/select params={q=x} status=0 QTime=3",
            "",
        ];

        for line in cases {
            assert_eq!(LogRecord::parse(line), Err(ParseError::NoMatch), "{line}");
        }
    }

    #[test]
    fn unusable_hits_keep_the_line() {
        let cases = [
            ("INFO: [c1] webapp=/solr path=/select params={q=x} hits=abc status=0 QTime=3", 3),
            ("INFO: [c1] webapp=/solr path=/select params={q=x} hits=99999999999999999999999 status=0 QTime=4", 4),
        ];

        for (line, qtime) in cases {
            let record = LogRecord::parse(line).unwrap();
            assert_eq!(record.hits, None, "{line}");
            assert_eq!(record.query_time_ms, qtime);
            assert_eq!(record.search_params, "q=x");
        }
    }

    #[test]
    fn overflowing_qtime_is_rejected() {
        let line = "INFO: [c1] webapp=/solr path=/select params={q=x} status=0 QTime=99999999999999999999999";

        assert!(matches!(
            LogRecord::parse(line),
            Err(ParseError::InvalidNumber { field: "QTime", .. })
        ));
    }
}
