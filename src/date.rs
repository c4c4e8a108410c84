//! Date and time strings.
//!
//! Dates, date-times and times are carried as strings. Literals and
//! conversions normalize them here so that equal instants compare equal as
//! text.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

const TIME_TEMPLATE: &str = "T00:00:00.000Z";

/// Normalizes a date, date-time or time string.
///
/// - `T12:30` is padded to `T12:30:00.000Z`
/// - partial and full dates (`2024`, `2024-01`, `2024-01-15`) are kept as-is
/// - date-times become UTC `YYYY-MM-DDThh:mm:ss.sssZ`
///
/// Anything that does not parse is returned unchanged.
///
/// ```
/// use fhirpath_lang::date::parse_date_string;
///
/// assert_eq!(parse_date_string("T12:30"), "T12:30:00.000Z");
/// assert_eq!(parse_date_string("2024-01-15"), "2024-01-15");
/// assert_eq!(parse_date_string("2024-01-15T10:00:00+02:00"), "2024-01-15T08:00:00.000Z");
/// ```
pub fn parse_date_string(text: &str) -> String {
    if text.starts_with('T') {
        let padding = TIME_TEMPLATE.get(text.len()..).unwrap_or_default();
        return format!("{}{}", text, padding);
    }
    if text.chars().count() <= 10 {
        return text.to_string();
    }
    match parse_instant(text) {
        Some(instant) => format_instant(&instant),
        None => text.to_string(),
    }
}

fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current instant, `YYYY-MM-DDThh:mm:ss.sssZ`.
pub fn now() -> String {
    format_instant(&Utc::now())
}

/// The current date, `YYYY-MM-DD`.
pub fn today() -> String {
    now()[..10].to_string()
}

/// The current time of day, `hh:mm:ss.sssZ`.
pub fn time_of_day() -> String {
    now()[11..].to_string()
}
