// crates/core/src/timespan.rs
//! Time-span placeholder substitution for SQL templates.
//!
//! Dashboard queries carry a fixed set of `{name:Type}` placeholder tokens
//! that parameterize the selected time window. Substitution is plain text
//! replacement: tokens not in the table are left untouched, and a template
//! with no tokens passes through unchanged, which makes the operation
//! idempotent once the first pass has consumed everything.

use jiff::tz::TimeZone;

use houseview_types::{TimeSpan, TimeSpanError};

/// Seconds of window per rounding bucket: a 100-point target resolution.
const ROUNDING_BUCKETS: i64 = 100;

/// Replace the six time-span placeholders in `sql` with values derived from
/// `span`, formatting wall-clock boundaries in the IANA timezone `timezone`.
///
/// With `span = None` the template is returned trimmed but otherwise
/// unchanged (the panel has no time selection yet).
pub fn substitute_time_span(
    sql: &str,
    span: Option<&TimeSpan>,
    timezone: &str,
) -> Result<String, TimeSpanError> {
    let sql = sql.trim();
    let Some(span) = span else {
        return Ok(sql.to_string());
    };

    let (start, end) = span.resolve()?;
    let tz = TimeZone::get(timezone).map_err(|_| TimeSpanError::Timezone {
        name: timezone.to_string(),
    })?;

    let seconds = (end.as_millisecond() - start.as_millisecond()) / 1000;
    let rounding = (seconds / ROUNDING_BUCKETS).max(1);
    let from = format!("'{}'", start.to_zoned(tz.clone()).strftime("%Y-%m-%d %H:%M:%S"));
    let to = format!("'{}'", end.to_zoned(tz).strftime("%Y-%m-%d %H:%M:%S"));

    let replacements: [(&str, String); 6] = [
        ("{rounding:UInt32}", rounding.to_string()),
        ("{seconds:UInt32}", seconds.to_string()),
        ("{startTimestamp:UInt32}", start.as_second().to_string()),
        ("{endTimestamp:UInt32}", end.as_second().to_string()),
        ("{from:String}", from),
        ("{to:String}", to),
    ];

    let mut out = sql.to_string();
    for (token, value) in &replacements {
        if out.contains(token) {
            out = out.replace(token, value);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn span() -> TimeSpan {
        // 6000 seconds wide.
        TimeSpan::new("2024-01-01T00:00:00Z", "2024-01-01T01:40:00Z")
    }

    #[test]
    fn test_no_span_trims_only() {
        let sql = "  SELECT 1  ";
        assert_eq!(substitute_time_span(sql, None, "UTC").unwrap(), "SELECT 1");
    }

    #[test]
    fn test_rounding_token() {
        let out = substitute_time_span(
            "... interval {rounding:UInt32} second ...",
            Some(&span()),
            "UTC",
        )
        .unwrap();
        assert_eq!(out, "... interval 60 second ...");
    }

    #[test]
    fn test_rounding_floor_is_one() {
        // 10-second window: 10 / 100 floors to 0, clamped to 1.
        let narrow = TimeSpan::new("2024-01-01T00:00:00Z", "2024-01-01T00:00:10Z");
        let out =
            substitute_time_span("{rounding:UInt32}|{seconds:UInt32}", Some(&narrow), "UTC")
                .unwrap();
        assert_eq!(out, "1|10");
    }

    #[test]
    fn test_timestamp_tokens() {
        let out = substitute_time_span(
            "WHERE t >= {startTimestamp:UInt32} AND t <= {endTimestamp:UInt32}",
            Some(&span()),
            "UTC",
        )
        .unwrap();
        assert_eq!(out, "WHERE t >= 1704067200 AND t <= 1704073200");
    }

    #[test]
    fn test_boundary_strings_quoted_in_timezone() {
        let out = substitute_time_span(
            "BETWEEN {from:String} AND {to:String}",
            Some(&span()),
            "Europe/Berlin",
        )
        .unwrap();
        // UTC midnight is 01:00 in Berlin that day.
        assert_eq!(out, "BETWEEN '2024-01-01 01:00:00' AND '2024-01-01 02:40:00'");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let out = substitute_time_span(
            "{seconds:UInt32} + {seconds:UInt32}",
            Some(&span()),
            "UTC",
        )
        .unwrap();
        assert_eq!(out, "6000 + 6000");
    }

    #[test]
    fn test_unknown_placeholders_left_alone() {
        let out =
            substitute_time_span("SELECT {database:String}", Some(&span()), "UTC").unwrap();
        assert_eq!(out, "SELECT {database:String}");
    }

    #[test]
    fn test_unknown_timezone_errors() {
        let err = substitute_time_span("SELECT 1", Some(&span()), "Mars/Olympus").unwrap_err();
        assert!(matches!(err, TimeSpanError::Timezone { .. }));
    }

    #[test]
    fn test_invalid_span_errors() {
        let bad = TimeSpan::new("garbage", "2024-01-01T00:00:00Z");
        assert!(substitute_time_span("SELECT 1", Some(&bad), "UTC").is_err());
    }

    proptest! {
        // Once the first pass has consumed every token, a second pass is a
        // no-op: substitute(substitute(sql)) == substitute(sql).
        #[test]
        fn prop_substitution_idempotent(head in "[a-zA-Z0-9 ,=<>()*]{0,40}", tail in "[a-zA-Z0-9 ,=<>()*]{0,40}") {
            let sql = format!("{head} {{rounding:UInt32}} {{from:String}} {tail}");
            let once = substitute_time_span(&sql, Some(&span()), "UTC").unwrap();
            let twice = substitute_time_span(&once, Some(&span()), "UTC").unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
