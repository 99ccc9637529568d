// crates/types/src/time_span.rs
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// An absolute start/end time range used to parameterize time-windowed
/// queries. Produced by the frontend's time-range picker; consumed read-only.
///
/// Both boundaries are ISO-8601 instants (any offset; normalized to UTC when
/// parsed). Invariant: start ≤ end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
pub struct TimeSpan {
    #[serde(rename = "startISO8601")]
    pub start: String,
    #[serde(rename = "endISO8601")]
    pub end: String,
}

/// Errors raised when a `TimeSpan` fails to parse or order correctly.
#[derive(Debug, Error)]
pub enum TimeSpanError {
    #[error("invalid {which} boundary {value:?}: {source}")]
    Parse {
        which: &'static str,
        value: String,
        #[source]
        source: jiff::Error,
    },

    #[error("time span ends before it starts ({start} > {end})")]
    Backwards { start: String, end: String },

    #[error("unknown timezone {name:?}")]
    Timezone { name: String },
}

impl TimeSpan {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Parse both boundaries and enforce the start ≤ end invariant.
    pub fn resolve(&self) -> Result<(Timestamp, Timestamp), TimeSpanError> {
        let start: Timestamp = self.start.parse().map_err(|source| TimeSpanError::Parse {
            which: "start",
            value: self.start.clone(),
            source,
        })?;
        let end: Timestamp = self.end.parse().map_err(|source| TimeSpanError::Parse {
            which: "end",
            value: self.end.clone(),
            source,
        })?;
        if start > end {
            return Err(TimeSpanError::Backwards {
                start: self.start.clone(),
                end: self.end.clone(),
            });
        }
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_utc_pair() {
        let span = TimeSpan::new("2024-01-01T00:00:00Z", "2024-01-01T01:40:00Z");
        let (start, end) = span.resolve().expect("valid span");
        assert_eq!(start.as_second(), 1_704_067_200);
        assert_eq!(end.as_second() - start.as_second(), 6000);
    }

    #[test]
    fn test_resolve_offset_normalizes_to_utc() {
        let span = TimeSpan::new("2024-01-01T02:00:00+02:00", "2024-01-01T03:00:00+02:00");
        let (start, _) = span.resolve().expect("valid span");
        assert_eq!(start.as_second(), 1_704_067_200);
    }

    #[test]
    fn test_resolve_rejects_backwards_span() {
        let span = TimeSpan::new("2024-01-02T00:00:00Z", "2024-01-01T00:00:00Z");
        let err = span.resolve().unwrap_err();
        assert!(matches!(err, TimeSpanError::Backwards { .. }));
    }

    #[test]
    fn test_resolve_rejects_garbage() {
        let span = TimeSpan::new("not a time", "2024-01-01T00:00:00Z");
        let err = span.resolve().unwrap_err();
        assert!(matches!(err, TimeSpanError::Parse { which: "start", .. }));
    }

    #[test]
    fn test_equal_boundaries_are_valid() {
        let span = TimeSpan::new("2024-01-01T00:00:00Z", "2024-01-01T00:00:00Z");
        assert!(span.resolve().is_ok());
    }

    #[test]
    fn test_serde_field_names() {
        let span = TimeSpan::new("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");
        let json = serde_json::to_string(&span).unwrap();
        assert!(json.contains("\"startISO8601\""));
        assert!(json.contains("\"endISO8601\""));
    }
}
