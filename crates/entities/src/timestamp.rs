//! Timestamp helpers.
//!
//! Stored timestamps carry microsecond precision and are written as
//! fixed-width RFC 3339 text, so comparing the stored strings gives the same
//! order as comparing the instants.

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};

/// Returns the current instant truncated to microseconds.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Returns a timestamp for a mutation of a record last stamped at
/// `previous`. The result is always strictly later than `previous`.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Formats a timestamp for storage.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}
