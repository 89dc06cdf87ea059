// ⏰ Temporal Parsing - datetime coercion for "time" columns
//
// Two modes:
// 1. Strict: the status-log `timestamp` column, exactly YYYY-MM-DDTHH:MM:SSZ
// 2. Inferred: any other column whose name mentions "time"; the first
//    matching format wins, bare times of day are anchored on 1970-01-01

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Format of the participant status log `timestamp` column
pub const STATUS_LOG_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

const TIME_FORMATS: &[&str] = &["%I:%M:%S %p", "%I:%M %p", "%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

/// Does this column take part in datetime normalization?
pub fn is_time_column(name: &str) -> bool {
    name.to_lowercase().contains("time")
}

/// Width of a `YYYY-MM-DDTHH:MM:SSZ` value
const STATUS_LOG_WIDTH: usize = 20;

/// Parse with the fixed status-log format; no fallbacks, no padding
pub fn parse_strict(value: &str) -> Result<DateTime<Utc>, String> {
    // chrono tolerates unpadded fields and leading blanks
    if value.len() != STATUS_LOG_WIDTH {
        return Err(format!(
            "expected {} ({} characters), got {} characters",
            STATUS_LOG_FORMAT,
            STATUS_LOG_WIDTH,
            value.len()
        ));
    }
    NaiveDateTime::parse_from_str(value, STATUS_LOG_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| format!("expected {}: {}", STATUS_LOG_FORMAT, e))
}

/// Parse a value whose format is not known in advance
pub fn parse_inferred(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
        }
    }

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).ok_or("invalid epoch date")?;
    for format in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&epoch.and_time(time)));
        }
    }

    Err("no known datetime format matches".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_is_time_column_case_insensitive() {
        assert!(is_time_column("timestamp"));
        assert!(is_time_column("travelStartTime"));
        assert!(is_time_column("TIME"));
        assert!(!is_time_column("participantId"));
    }

    #[test]
    fn test_strict_accepts_only_exact_format() {
        let dt = parse_strict("2022-03-01T08:00:00Z").unwrap();
        assert_eq!(dt.hour(), 8);

        assert!(parse_strict("2022-03-01 08:00:00").is_err());
        assert!(parse_strict("2022-03-01T08:00:00.5Z").is_err());
        assert!(parse_strict("yesterday").is_err());
        assert!(parse_strict(" 2022-03-01T08:00:00Z").is_err());
        assert!(parse_strict("2022-03-01T08:00:00Z ").is_err());
        assert!(parse_strict("2022-3-01T08:00:00Z").is_err());
    }

    #[test]
    fn test_inferred_formats() {
        let rfc = parse_inferred("2022-03-01T09:15:30.250Z").unwrap();
        assert_eq!(rfc.nanosecond(), 250_000_000);

        let spaced = parse_inferred("2022-03-01 09:15:30").unwrap();
        assert_eq!(spaced.minute(), 15);

        let date_only = parse_inferred("03/02/2022").unwrap();
        assert_eq!((date_only.month(), date_only.day()), (3, 2));
    }

    #[test]
    fn test_time_of_day_anchored_on_epoch() {
        let dt = parse_inferred("7:30:00 PM").unwrap();
        assert_eq!(dt.year(), 1970);
        assert_eq!((dt.hour(), dt.minute()), (19, 30));
    }

    #[test]
    fn test_inferred_rejects_garbage() {
        assert!(parse_inferred("not a time").is_err());
        assert!(parse_inferred("2022-13-45").is_err());
    }
}
