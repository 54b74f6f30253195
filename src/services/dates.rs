//! Date plumbing shared by the event services. Timestamps are persisted as
//! `"%Y-%m-%d %H:%M:%S"` TEXT; everything that needs arithmetic parses into
//! `chrono::NaiveDateTime` here.

use chrono::{Duration, NaiveDateTime};

use super::error::ServiceError;

pub const DB_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cancelling a reserved slot closer to the start than this is "late".
pub const LATE_CANCELLATION_HOURS: i64 = 24;

pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub fn format_db(value: NaiveDateTime) -> String {
    value.format(DB_DATETIME_FORMAT).to_string()
}

pub fn parse_db(value: &str) -> Result<NaiveDateTime, ServiceError> {
    NaiveDateTime::parse_from_str(value, DB_DATETIME_FORMAT)
        .map_err(|e| ServiceError::InvalidDates(format!("{value}: {e}")))
}

pub fn has_started(event_date: NaiveDateTime, now: NaiveDateTime) -> bool {
    now >= event_date
}

/// An absent opening date means registration is open; an unparseable one
/// means it never opens.
pub fn registration_open(opening_date: Option<&str>, now: NaiveDateTime) -> bool {
    match opening_date {
        None => true,
        Some(raw) => match NaiveDateTime::parse_from_str(raw, DB_DATETIME_FORMAT) {
            Ok(opens) => now > opens,
            Err(_) => false,
        },
    }
}

pub fn is_late_cancellation(event_date: NaiveDateTime, now: NaiveDateTime) -> bool {
    event_date.signed_duration_since(now) < Duration::hours(LATE_CANCELLATION_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, DB_DATETIME_FORMAT).unwrap()
    }

    #[test]
    fn registration_window() {
        let now = dt("2026-03-01 12:00:00");
        assert!(registration_open(None, now));
        assert!(registration_open(Some("2026-03-01 11:59:59"), now));
        assert!(!registration_open(Some("2026-03-01 12:00:00"), now));
        assert!(!registration_open(Some("2026-03-02 00:00:00"), now));
        assert!(!registration_open(Some("not a date"), now));
    }

    #[test]
    fn late_cancellation_window() {
        let start = dt("2026-03-02 12:00:00");
        assert!(is_late_cancellation(start, dt("2026-03-02 10:00:00")));
        assert!(is_late_cancellation(start, dt("2026-03-01 12:00:01")));
        assert!(!is_late_cancellation(start, dt("2026-03-01 12:00:00")));
        assert!(!is_late_cancellation(start, dt("2026-02-20 12:00:00")));
    }
}
