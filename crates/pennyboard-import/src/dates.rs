//! Tolerant calendar-date parsing.
//!
//! The source documents carry dates in whatever format the producing client
//! happened to emit. Anything recognisable becomes a [`NaiveDate`]; anything
//! else is `None` and the caller substitutes its own fallback.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Literal used by the watch list for "due date not known yet".
pub const DUE_DATE_UNKNOWN: &str = "TBD";

const DATETIME_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S%.f",
  "%m/%d/%Y %H:%M:%S",
  "%m/%d/%Y %I:%M:%S %p",
];

const DATE_FORMATS: &[&str] = &[
  "%Y-%m-%d",
  "%Y/%m/%d",
  "%m/%d/%Y",
  "%B %d, %Y",
  "%b %d, %Y",
  "%d %B %Y",
];

/// Parse a date in any of the accepted forms. Time-of-day and offsets are
/// discarded; an RFC 3339 timestamp keeps the date as written, not as
/// converted to UTC.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
  let s = raw.trim();
  if s.is_empty() {
    return None;
  }

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.date_naive());
  }

  DATETIME_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .map(|dt| dt.date())
    .or_else(|| {
      DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    })
}

/// Parse a watch-list due date. Both the [`DUE_DATE_UNKNOWN`] sentinel
/// (any case) and unreadable text yield `None`; callers cannot tell the two
/// apart.
pub fn parse_due_date(raw: Option<&str>) -> Option<NaiveDate> {
  let raw = raw?;
  if raw.trim().eq_ignore_ascii_case(DUE_DATE_UNKNOWN) {
    return None;
  }
  parse_date(raw)
}
