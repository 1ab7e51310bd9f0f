// 📅 Month bucketing - calendar-month keys and half-open month ranges
//
// Reference timezone is UTC for the whole store. An entry's month never
// depends on the caller's local clock.

use chrono::{DateTime, Datelike, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::clock::Clock;
use crate::error::LedgerError;

// ============================================================================
// MONTH KEY
// ============================================================================

/// A calendar month, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, LedgerError> {
        if !(1..=9999).contains(&year) || !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidMonthKey(format!("{:04}-{:02}", year, month)));
        }
        Ok(MonthKey { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Month containing the clock's current instant.
    pub fn current(clock: &dyn Clock) -> Self {
        month_key_of(clock.now())
    }

    /// The month immediately after this one, rolling the year over after December.
    pub fn next(&self) -> (i32, u32) {
        if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        }
    }

    /// Number of days in this month.
    pub fn days(&self) -> u32 {
        let (start, end) = month_range(self);
        (end - start).num_days() as u32
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = LedgerError;

    /// Accepts exactly `YYYY-MM`: four year digits, a dash, two month digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidMonthKey(s.to_string());

        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        let digits_ok = bytes[..4].iter().chain(&bytes[5..]).all(u8::is_ascii_digit);
        if !digits_ok {
            return Err(invalid());
        }

        let year: i32 = s[..4].parse().map_err(|_| invalid())?;
        let month: u32 = s[5..].parse().map_err(|_| invalid())?;

        MonthKey::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// BUCKETING
// ============================================================================

/// Month key of a timestamp, evaluated in UTC.
pub fn month_key_of(timestamp: DateTime<Utc>) -> MonthKey {
    MonthKey {
        year: timestamp.year(),
        month: timestamp.month(),
    }
}

/// Half-open `[start, end)` interval covering exactly the given month.
pub fn month_range(key: &MonthKey) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = midnight_utc(key.year, key.month);
    let (next_year, next_month) = key.next();
    let end = midnight_utc(next_year, next_month);
    (start, end)
}

fn midnight_utc(year: i32, month: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// ============================================================================
// STORAGE ENCODING
// ============================================================================

/// Fixed-width RFC 3339 form used in the database.
///
/// Every stored timestamp has microsecond precision and a `Z` suffix, so
/// string comparison in SQL agrees with chronological order.
pub fn to_storage(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_storage(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let key: MonthKey = "2024-02".parse().unwrap();
        assert_eq!(key.year(), 2024);
        assert_eq!(key.month(), 2);
        assert_eq!(key.to_string(), "2024-02");
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for raw in [
            "", "2024", "2024-1", "2024-001", "24-01", "2024/01", "2024-13", "2024-00",
            "0000-05", "abcd-01", "2024-0a", "+024-01", " 2024-01", "2024-01 ",
        ] {
            let result = raw.parse::<MonthKey>();
            assert!(
                matches!(result, Err(LedgerError::InvalidMonthKey(ref k)) if k == raw),
                "expected InvalidMonthKey for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_month_boundary_bucketing() {
        let last_instant_jan = utc(2024, 1, 31, 23, 59, 59) + Duration::microseconds(999_999);
        let first_instant_feb = utc(2024, 2, 1, 0, 0, 0);

        assert_eq!(month_key_of(last_instant_jan).to_string(), "2024-01");
        assert_eq!(month_key_of(first_instant_feb).to_string(), "2024-02");
    }

    #[test]
    fn test_month_range_half_open() {
        let key: MonthKey = "2024-01".parse().unwrap();
        let (start, end) = month_range(&key);

        assert_eq!(start, utc(2024, 1, 1, 0, 0, 0));
        assert_eq!(end, utc(2024, 2, 1, 0, 0, 0));

        let last = end - Duration::microseconds(1);
        assert!(start <= last && last < end);
        assert_eq!(month_key_of(last), key);
        assert_ne!(month_key_of(end), key);
    }

    #[test]
    fn test_month_range_year_rollover() {
        let key: MonthKey = "2024-12".parse().unwrap();
        let (start, end) = month_range(&key);

        assert_eq!(start, utc(2024, 12, 1, 0, 0, 0));
        assert_eq!(end, utc(2025, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_month_lengths() {
        let days = |k: &str| k.parse::<MonthKey>().unwrap().days();

        assert_eq!(days("2024-01"), 31);
        assert_eq!(days("2024-02"), 29);
        assert_eq!(days("2023-02"), 28);
        assert_eq!(days("2100-02"), 28);
        assert_eq!(days("2000-02"), 29);
        assert_eq!(days("2024-04"), 30);
        assert_eq!(days("2024-12"), 31);
    }

    #[test]
    fn test_storage_encoding_sorts_chronologically() {
        let a = utc(2024, 1, 31, 23, 59, 59) + Duration::microseconds(999_999);
        let b = utc(2024, 2, 1, 0, 0, 0);
        let c = utc(2024, 2, 1, 0, 0, 0) + Duration::microseconds(5);

        let (sa, sb, sc) = (to_storage(a), to_storage(b), to_storage(c));

        assert_eq!(sb, "2024-02-01T00:00:00.000000Z");
        assert!(sa < sb && sb < sc);
        assert_eq!(from_storage(&sa), Some(a));
        assert_eq!(from_storage(&sc), Some(c));
        assert_eq!(from_storage("not a date"), None);
    }

    #[test]
    fn test_month_key_serde() {
        let key: MonthKey = serde_json::from_str("\"2023-07\"").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2023-07\"");
        assert!(serde_json::from_str::<MonthKey>("\"2023-7\"").is_err());
    }
}
