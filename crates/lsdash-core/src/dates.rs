// ── API date handling ──
//
// LearningStudio timestamps are UTC, with or without millisecond
// precision. Search windows use a US short date. Course-relative display
// converts into the course's IANA zone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// `yyyy-MM-dd'T'HH:mm:ss'Z'`
pub const NORMAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
/// `yyyy-MM-dd'T'HH:mm:ss.SSS'Z'`
pub const LONG_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
/// `MM/dd/yyyy`
pub const SHORT_FORMAT: &str = "%m/%d/%Y";
/// `yyyy-MM-dd hh:mm a`
pub const HUMAN_FORMAT: &str = "%Y-%m-%d %I:%M %p";

/// Parse an API timestamp, trying the seconds format before milliseconds.
pub fn parse_api_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, NORMAL_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, LONG_FORMAT))
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(NORMAL_FORMAT).to_string()
}

pub fn format_short_date(day: NaiveDate) -> String {
    day.format(SHORT_FORMAT).to_string()
}

/// `raw` parses and lies strictly after `baseline`. Missing or unparseable
/// values are never "after".
pub fn is_strictly_after(raw: Option<&str>, baseline: DateTime<Utc>) -> bool {
    raw.and_then(parse_api_timestamp)
        .is_some_and(|at| at > baseline)
}

/// Render an API timestamp in `zone`, falling back to UTC for unknown
/// zones. Unparseable input renders as an empty string.
pub fn render_in_zone(raw: &str, zone: Option<&str>, humanize: bool) -> String {
    let Some(at) = parse_api_timestamp(raw) else {
        return String::new();
    };
    let tz = zone.and_then(|z| z.parse::<Tz>().ok()).unwrap_or(Tz::UTC);
    let local = at.with_timezone(&tz);
    let format = if humanize { HUMAN_FORMAT } else { NORMAL_FORMAT };
    local.format(format).to_string()
}
