// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt::{Display, Formatter};

pub const INVALID_DATE_SENTINEL: &str = "Invalid date";

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    InvalidDate(String),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::InvalidDate(raw) => write!(f, "not a calendar date: {raw}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `YYYY-MM-DDTHH:MM:SS`.
/// Timestamps keep the calendar date as written, without timezone shifting.
pub fn parse_calendar_date(input: &str) -> Result<NaiveDate, ParseError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ParseError::Empty("date"));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts.date());
        }
    }
    Err(ParseError::InvalidDate(s.to_string()))
}

/// Display form of a gateway date field; unparseable input shows the sentinel.
#[must_use]
pub fn format_calendar_date(input: &str) -> String {
    parse_calendar_date(input)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| INVALID_DATE_SENTINEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_timestamp_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 6, 20).expect("date");
        assert_eq!(parse_calendar_date("2025-06-20"), Ok(expected));
        assert_eq!(parse_calendar_date("2025-06-20T10:15:00Z"), Ok(expected));
        assert_eq!(parse_calendar_date("2025-06-20T23:59:59+03:00"), Ok(expected));
        assert_eq!(parse_calendar_date("2025-06-20T08:00:00.123"), Ok(expected));
    }

    #[test]
    fn rejects_non_calendar_input() {
        assert_eq!(parse_calendar_date("  "), Err(ParseError::Empty("date")));
        assert!(matches!(
            parse_calendar_date("2025-02-30"),
            Err(ParseError::InvalidDate(_))
        ));
        assert_eq!(format_calendar_date("yesterday"), INVALID_DATE_SENTINEL);
        assert_eq!(format_calendar_date("2025-07-01T00:00:00Z"), "2025-07-01");
    }
}
