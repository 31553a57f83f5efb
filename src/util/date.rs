use chrono::{DateTime, FixedOffset};

pub const JIRA_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Parse an export timestamp. Empty or malformed input gives `None`.
pub fn parse_jira_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_str(value, JIRA_DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .ok()
}

pub fn to_unix_ms(value: &DateTime<FixedOffset>) -> i64 {
    value.timestamp_millis()
}

pub fn format_long(value: &DateTime<FixedOffset>) -> String {
    value.format("%B %d, %Y at %H:%M").to_string()
}

pub fn format_short(value: Option<&DateTime<FixedOffset>>) -> String {
    match value {
        Some(v) => v.format("%Y-%m-%d %H:%M:%S %:z").to_string(),
        None => "unknown date".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_export_format() {
        let parsed = parse_jira_date("Wed, 9 Jul 2025 14:31:57 +0200").unwrap();
        assert_eq!(parsed.year(), 2025);
        assert_eq!(parsed.month(), 7);
        assert_eq!(parsed.day(), 9);
        assert_eq!(parsed.hour(), 14);
        assert_eq!(parsed.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn parses_two_digit_day() {
        assert!(parse_jira_date("Mon, 14 Apr 2025 09:05:00 +0000").is_some());
    }

    #[test]
    fn garbage_is_absent() {
        assert!(parse_jira_date("garbage").is_none());
        assert!(parse_jira_date("").is_none());
        assert!(parse_jira_date("   ").is_none());
        assert!(parse_jira_date("2025-07-09").is_none());
    }

    #[test]
    fn converts_to_epoch_millis() {
        let parsed = parse_jira_date("Thu, 1 Jan 1970 01:00:01 +0100").unwrap();
        assert_eq!(to_unix_ms(&parsed), 1000);
    }

    #[test]
    fn formats_for_humans() {
        let parsed = parse_jira_date("Wed, 9 Jul 2025 14:31:57 +0200").unwrap();
        assert_eq!(format_long(&parsed), "July 09, 2025 at 14:31");
        assert_eq!(format_short(Some(&parsed)), "2025-07-09 14:31:57 +02:00");
        assert_eq!(format_short(None), "unknown date");
    }
}
