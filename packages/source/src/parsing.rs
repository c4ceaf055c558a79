//! Shared parsing utilities for incident rows.
//!
//! Date and coordinate parsing used by the Socrata fetcher and by the
//! client-side filter guard applied after each incident fetch.

use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime, Utc};
use crime_grid_crime_models::{CoordinateValue, IncidentQuery, IncidentRecord};

/// Parses a Socrata datetime string (ISO 8601 with optional fractional
/// seconds, or a bare `YYYY-MM-DD` date).
#[must_use]
pub fn parse_socrata_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}

/// Returns the calendar year of a record's timestamp, if it parses.
#[must_use]
pub fn record_year(record: &IncidentRecord) -> Option<i32> {
    record
        .date
        .as_deref()
        .and_then(parse_socrata_date)
        .map(|dt| dt.year())
}

/// Whether a fetched record belongs to `query`.
///
/// The crime type must match exactly. The year must match when the date
/// parses; records with unparseable dates are kept.
#[must_use]
pub fn matches_query(record: &IncidentRecord, query: &IncidentQuery) -> bool {
    if record.primary_type != query.crime_type {
        return false;
    }
    record_year(record).is_none_or(|year| year == query.year)
}

/// Converts a raw JSON value into a [`CoordinateValue`]. Returns `None` for
/// nulls, booleans, arrays, and objects.
#[must_use]
pub fn coordinate_from_json(value: &serde_json::Value) -> Option<CoordinateValue> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().map(CoordinateValue::Number),
        serde_json::Value::String(s) => Some(CoordinateValue::Text(s.clone())),
        _ => None,
    }
}
