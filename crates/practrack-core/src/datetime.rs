// ── Date conversion between wire and form ──
//
// The server speaks ISO-8601 UTC (`2022-09-04T07:30:08.891Z`). Forms show
// minutes-precision local time (`2022-09-04T09:30`). Everything here is
// generic over the zone so tests can pin an offset.

use std::fmt::Display;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Form input/output format.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Compact format for tables and detail views.
pub const LIST_FORMAT: &str = "%d/%m/%y %H:%M";

/// Local formats accepted besides RFC 3339.
const ACCEPTED_FORMATS: &[&str] = &[
    DISPLAY_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Wire timestamp to form text in `tz`.
pub fn to_display<Tz>(dt: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    dt.with_timezone(tz).format(DISPLAY_FORMAT).to_string()
}

/// Form text in `tz` to a wire timestamp.
///
/// Accepts RFC 3339 (zone taken from the text), the display format, the
/// same with seconds or a space separator, and a bare date (midnight).
/// Returns `None` for anything else, including times skipped by a DST
/// transition.
pub fn from_display<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Default form value for a new date: the start of `now`'s day.
pub fn default_display<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{}T00:00", now.format("%Y-%m-%d"))
}

/// Wire timestamp rendered for tables.
pub fn format_for_list<Tz>(dt: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    dt.with_timezone(tz).format(LIST_FORMAT).to_string()
}
