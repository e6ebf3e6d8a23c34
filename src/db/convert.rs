//! Boundary conversions between externally sourced values and the graph
//! store's native representations.
//!
//! Identifiers and ranks may arrive as strings from the transport layer;
//! timestamps are bound as millisecond-precision RFC 3339 UTC strings and
//! converted to the store's temporal type with `datetime($at)` inside each
//! statement.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{AppError, AppResult};

/// Parses an externally sourced identifier or rank into the store's native
/// 64-bit integer form. Total: malformed input is an `InvalidInput` error,
/// never a panic.
pub fn parse_id(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::InvalidInput(format!("malformed identifier: {:?}", raw)))
}

/// Formats an instant for binding into a `datetime($...)` parameter.
/// Millisecond precision, UTC, no timezone ambiguity.
pub(crate) fn datetime_param(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parses a timestamp read back from the store. Tries RFC 3339 first (the
/// store renders datetimes with an offset), then the naive writer format.
pub(crate) fn parse_datetime(raw: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    Err(AppError::MalformedRow(format!(
        "unparseable timestamp: {:?}",
        raw
    )))
}

/// Typed access to one named field of a result row, failing fast when the
/// field is absent or carries the wrong type.
pub(crate) fn row_field<'a, T: serde::Deserialize<'a>>(
    row: &'a neo4rs::Row,
    name: &str,
) -> AppResult<T> {
    row.get::<T>(name)
        .map_err(|e| AppError::MalformedRow(format!("field `{}`: {}", name, e)))
}
