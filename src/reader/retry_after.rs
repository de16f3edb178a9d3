//! Retry-After header parsing
//!
//! A remote may suggest how long to wait either as a whole number of seconds
//! or as an absolute HTTP-date. Both are normalized to whole seconds from now.

use chrono::{DateTime, NaiveDateTime, Utc};

/// RFC 850 date, obsoleted by RFC 7231 but still accepted by clients
const RFC850_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S GMT";

/// ANSI C asctime() date
const ASCTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Parses a Retry-After value into whole seconds remaining
///
/// Integer values are used verbatim. HTTP-dates are converted to the number of
/// seconds between `now` and that instant, truncated, with dates in the past
/// flooring to zero.
///
/// # Returns
///
/// * `Some(seconds)` - The value parsed in one of the supported forms
/// * `None` - The value is not a valid hint
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<u64> {
    let value = value.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(seconds);
    }

    let at = parse_http_date(value)?;
    let remaining = (at - now).num_seconds();
    Some(remaining.max(0) as u64)
}

/// Parses the three date formats an HTTP/1.1 recipient must accept
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    // IMF-fixdate is a subset of RFC 2822
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, RFC850_FORMAT) {
        return Some(naive.and_utc());
    }

    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&collapsed, ASCTIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
