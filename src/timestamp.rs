//! Timestamp coercion for the `created_at`, `ts1` and `ts2` columns.
//!
//! Values are normalized to UTC wall-clock time. Strings without an offset are
//! taken to already be in UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Formats carrying an explicit UTC offset. `%z` accepts both `+0000` and `+00:00`.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    // Classic Twitter API form: "Wed Oct 10 20:19:24 +0000 2018"
    "%a %b %d %H:%M:%S %z %Y",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a timestamp string into a UTC wall-clock datetime.
/// Returns None when no supported form matches.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(naive) = s.strip_suffix(|c| c == 'Z' || c == 'z') {
        return parse_naive(naive);
    }

    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.naive_utc())
        .or_else(|| parse_naive(s))
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Milliseconds since the Unix epoch, the physical value of a `Datetime(Milliseconds)` column.
pub fn to_epoch_millis(dt: &NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_millis()
}

/// Convert a `Date` physical value (days since the Unix epoch) back to a calendar date.
pub fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    const UNIX_EPOCH_CE_DAYS: i32 = 719_163;
    NaiveDate::from_num_days_from_ce_opt(UNIX_EPOCH_CE_DAYS.checked_add(days)?)
}
