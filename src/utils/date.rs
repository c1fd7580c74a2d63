//! Date parsing and validity checks for front matter.
//!
//! Front matter accepts either a plain `YYYY-MM-DD` date or a full RFC 3339
//! timestamp. Validity checks take the clock as a parameter so the build
//! pipeline can inject a fixed `now` in tests.

use chrono::{DateTime, NaiveDate, Utc};

/// Parse a front matter date string.
///
/// Accepted forms:
/// - `2024-05-01` (midnight UTC)
/// - `2024-05-01T08:30:00Z` (RFC 3339)
///
/// Returns `None` for anything else.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// A page is expired once its expiry date has passed.
pub fn is_expired(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expiry.is_some_and(|e| e <= now)
}

/// A page is publishable once its publish date (or plain date, as the
/// fallback) is not in the future. Pages without either date are always
/// publishable.
pub fn is_publishable(
    publish: Option<DateTime<Utc>>,
    date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match publish.or(date) {
        Some(d) => d <= now,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_plain_date() {
        let dt = parse_date("2024-05-01").unwrap();
        assert_eq!(dt, at(2024, 5, 1));
    }

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_date("2024-05-01T08:30:00Z").unwrap();
        assert_eq!(
            dt.timestamp(),
            at(2024, 5, 1).timestamp() + 8 * 3600 + 30 * 60
        );
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_date("2024-05-01T02:00:00+02:00").unwrap();
        assert_eq!(dt, at(2024, 5, 1));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_date("05/01/2024").is_none());
        assert!(parse_date("not a date").is_none());
        assert!(parse_date("2024-13-01").is_none());
    }

    #[test]
    fn test_expired() {
        let now = at(2024, 6, 1);
        assert!(is_expired(Some(at(2024, 5, 1)), now));
        assert!(is_expired(Some(now), now)); // boundary counts as expired
        assert!(!is_expired(Some(at(2024, 7, 1)), now));
        assert!(!is_expired(None, now));
    }

    #[test]
    fn test_publishable_publish_date_wins() {
        let now = at(2024, 6, 1);
        // A future publish date beats an old plain date.
        assert!(!is_publishable(
            Some(at(2024, 7, 1)),
            Some(at(2024, 1, 1)),
            now
        ));
        assert!(is_publishable(Some(at(2024, 5, 1)), None, now));
    }

    #[test]
    fn test_publishable_falls_back_to_date() {
        let now = at(2024, 6, 1);
        assert!(is_publishable(None, Some(at(2024, 5, 1)), now));
        assert!(!is_publishable(None, Some(at(2024, 7, 1)), now));
        assert!(is_publishable(None, None, now));
    }
}
