//! Date formatting in radiko's fixed timezone
//!
//! radiko query parameters and XML attributes use two compact layouts,
//! `YYYYMMDD` and `YYYYMMDDhhmmss`, always expressed in Japan Standard Time
//! whatever the host's local timezone is.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

/// `YYYYMMDD`
pub const DATE_LAYOUT: &str = "%Y%m%d";

/// `YYYYMMDDhhmmss`
pub const DATETIME_LAYOUT: &str = "%Y%m%d%H%M%S";

/// IANA name of the timezone every output is normalized to
pub const TIMEZONE_NAME: &str = "Asia/Tokyo";

/// Asia/Tokyo has been UTC+09:00 without DST since 1951
const TOKYO_UTC_OFFSET_SECS: i32 = 9 * 3600;

// Rejected at compile time if out of range.
const TOKYO: FixedOffset = match FixedOffset::east_opt(TOKYO_UTC_OFFSET_SECS) {
    Some(offset) => offset,
    None => panic!("invalid Asia/Tokyo offset"),
};

/// The fixed timezone used by [`date`] and [`datetime`]
pub fn location() -> FixedOffset {
    TOKYO
}

/// Render `t` as `YYYYMMDD` in Asia/Tokyo
pub fn date<Tz: TimeZone>(t: &DateTime<Tz>) -> String {
    t.with_timezone(&TOKYO).format(DATE_LAYOUT).to_string()
}

/// Render `t` as `YYYYMMDDhhmmss` in Asia/Tokyo
pub fn datetime<Tz: TimeZone>(t: &DateTime<Tz>) -> String {
    t.with_timezone(&TOKYO).format(DATETIME_LAYOUT).to_string()
}

/// Parse a `YYYYMMDDhhmmss` string expressed in Asia/Tokyo
pub fn parse_datetime(s: &str) -> Result<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(s, DATETIME_LAYOUT)
        .map_err(|e| Error::decode(format!("invalid datetime {:?}: {}", s, e)))?;

    TOKYO
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| Error::decode(format!("ambiguous datetime {:?}", s)))
}
