//! Millisecond-precision dates

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use std::fmt;

/// A point in time as milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(i64);

impl Date {
    pub const fn from_millis(millis: i64) -> Self {
        Date(millis)
    }

    pub fn now() -> Self {
        Date(Utc::now().timestamp_millis())
    }

    pub const fn millis(self) -> i64 {
        self.0
    }

    /// `None` when the instant is outside chrono's representable range
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }

    /// Same shape as `Date.prototype.toISOString`
    pub fn to_rfc3339(self) -> Option<String> {
        self.to_datetime()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl From<DateTime<Utc>> for Date {
    fn from(dt: DateTime<Utc>) -> Self {
        Date(dt.timestamp_millis())
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Some(s) => f.write_str(&s),
            None => write!(f, "{}ms", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339_matches_iso_string() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let date = Date::from(dt);
        assert_eq!(date.millis(), 1_735_689_600_000);
        assert_eq!(date.to_rfc3339().unwrap(), "2025-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_pre_epoch() {
        let date = Date::from_millis(-1);
        assert_eq!(date.to_rfc3339().unwrap(), "1969-12-31T23:59:59.999Z");
    }

    #[test]
    fn test_out_of_range_has_no_datetime() {
        assert!(Date::from_millis(i64::MAX).to_datetime().is_none());
        assert_eq!(Date::from_millis(i64::MAX).to_string(), format!("{}ms", i64::MAX));
    }
}
