//! Date parsing for bank messages and statements

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;

/// Outcome of scanning a message body for an embedded date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCapture {
    /// No date token in the body; arrival time applies
    None,
    /// A well-formed embedded date (and optional time)
    Valid(DateTime<Utc>),
    /// A date-shaped token that is not a real calendar date
    Malformed,
}

/// Find, parse and cut the first `dd/mm/yyyy [HH:MM]` token out of a
/// message body.
///
/// Extracting the date before template matching keeps the greedy merchant
/// capture from swallowing the day digits; templates then never need date
/// groups of their own.
pub fn split_embedded_datetime(body: &str) -> (String, DateCapture) {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"(\d{2}/\d{2}/\d{4})(?:\s+(\d{1,2}:\d{2}))?").unwrap());

    let Some(caps) = pattern.captures(body) else {
        return (body.to_string(), DateCapture::None);
    };

    let whole = caps.get(0).unwrap();
    let mut cleaned = String::with_capacity(body.len());
    cleaned.push_str(&body[..whole.start()]);
    cleaned.push(' ');
    cleaned.push_str(&body[whole.end()..]);

    let capture = match parse_sms_date(
        caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
        caps.get(2).map(|m| m.as_str()),
    ) {
        Some(dt) => DateCapture::Valid(dt),
        None => DateCapture::Malformed,
    };

    (cleaned, capture)
}

/// Parse a `dd/mm/yyyy` date with an optional `HH:MM` time into a
/// timestamp. Bank messages embed local dates; we pin them to UTC
/// midnight (or the given time) since COP notifications carry no zone.
pub fn parse_sms_date(date_str: &str, time_str: Option<&str>) -> Option<DateTime<Utc>> {
    let date = parse_day_month_year(date_str)?;

    let time = match time_str {
        Some(t) => parse_hour_minute(t)?,
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };

    Some(date.and_time(time).and_utc())
}

/// `dd/mm/yyyy`
pub fn parse_day_month_year(s: &str) -> Option<NaiveDate> {
    let mut parts = s.trim().splitn(3, '/');
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `yyyy/mm/dd`, as statement periods are printed
pub fn parse_year_month_day(s: &str) -> Option<NaiveDate> {
    let mut parts = s.trim().splitn(3, '/');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_hour_minute(s: &str) -> Option<NaiveTime> {
    let mut parts = s.trim().splitn(2, ':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_date_with_time() {
        let dt = parse_sms_date("18/07/2025", Some("14:33")).unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2025, 7, 18).unwrap());
        assert_eq!((dt.hour(), dt.minute()), (14, 33));
    }

    #[test]
    fn test_date_without_time_is_midnight() {
        let dt = parse_sms_date("01/02/2024", None).unwrap();
        assert_eq!((dt.hour(), dt.minute()), (0, 0));
    }

    #[test]
    fn test_invalid_calendar_date() {
        assert!(parse_sms_date("45/13/2025", None).is_none());
        assert!(parse_day_month_year("18-07-2025").is_none());
    }

    #[test]
    fn test_period_format() {
        assert_eq!(
            parse_year_month_day("2025/06/01"),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
    }

    #[test]
    fn test_split_embedded_datetime() {
        let (cleaned, capture) =
            split_embedded_datetime("compra en FALABELLA 18/07/2025 14:33. T *4321");
        assert_eq!(cleaned, "compra en FALABELLA  . T *4321");
        match capture {
            DateCapture::Valid(dt) => {
                assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2025, 7, 18).unwrap());
                assert_eq!((dt.hour(), dt.minute()), (14, 33));
            }
            other => panic!("expected valid date, got {:?}", other),
        }
    }

    #[test]
    fn test_split_embedded_datetime_absent_and_malformed() {
        let (_, capture) = split_embedded_datetime("compra en EXITO");
        assert_eq!(capture, DateCapture::None);

        let (_, capture) = split_embedded_datetime("compra en EXITO 45/13/2025");
        assert_eq!(capture, DateCapture::Malformed);
    }
}
