//! BACnet date and time values with per-field wildcards.
//!
//! A field set to `None` is the wire wildcard (`0xFF`). Values resolve to a
//! [`NaiveDateTime`] only when every field except weekday and hundredths is
//! concrete.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Calendar date; `None` fields are wildcards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacnetDate {
    pub year: Option<u16>,
    pub month: Option<u8>,
    pub day: Option<u8>,
    /// 1 = Monday .. 7 = Sunday.
    pub weekday: Option<u8>,
}

/// Time of day; `None` fields are wildcards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacnetTime {
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    pub hundredths: Option<u8>,
}

/// Date and time pair as used by the Start_Time property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacnetDateTime {
    pub date: BacnetDate,
    pub time: BacnetTime,
}

impl BacnetDate {
    pub fn new(year: u16, month: u8, day: u8) -> Self {
        let weekday = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
            .map(|d| d.weekday().number_from_monday() as u8);
        Self {
            year: Some(year),
            month: Some(month),
            day: Some(day),
            weekday,
        }
    }

    pub fn wildcard() -> Self {
        Self::default()
    }

    pub fn is_wildcard(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.day.is_none() && self.weekday.is_none()
    }
}

impl BacnetTime {
    pub fn new(hour: u8, minute: u8, second: u8, hundredths: u8) -> Self {
        Self {
            hour: Some(hour),
            minute: Some(minute),
            second: Some(second),
            hundredths: Some(hundredths),
        }
    }

    pub fn wildcard() -> Self {
        Self::default()
    }

    pub fn is_wildcard(&self) -> bool {
        self.hour.is_none()
            && self.minute.is_none()
            && self.second.is_none()
            && self.hundredths.is_none()
    }
}

impl BacnetDateTime {
    pub fn new(date: BacnetDate, time: BacnetTime) -> Self {
        Self { date, time }
    }

    /// Fully wildcarded date-time, the "never configured" value.
    pub fn wildcard() -> Self {
        Self::default()
    }

    pub fn from_naive(value: NaiveDateTime) -> Self {
        let hundredths = (value.nanosecond() / 10_000_000).min(99) as u8;
        Self {
            date: BacnetDate::new(value.year() as u16, value.month() as u8, value.day() as u8),
            time: BacnetTime::new(
                value.hour() as u8,
                value.minute() as u8,
                value.second() as u8,
                hundredths,
            ),
        }
    }

    /// Returns `true` when both date and time are entirely wildcarded.
    pub fn is_wildcard(&self) -> bool {
        self.date.is_wildcard() && self.time.is_wildcard()
    }

    /// Resolves to a concrete timestamp, or `None` when a required field is
    /// wildcarded or the fields do not form a valid calendar date.
    pub fn resolve(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(
            i32::from(self.date.year?),
            u32::from(self.date.month?),
            u32::from(self.date.day?),
        )?;
        let hundredths = u32::from(self.time.hundredths.unwrap_or(0));
        date.and_hms_milli_opt(
            u32::from(self.time.hour?),
            u32::from(self.time.minute?),
            u32::from(self.time.second?),
            hundredths * 10,
        )
    }
}

fn field<T: fmt::Display>(value: Option<T>, width: usize) -> String {
    match value {
        Some(v) => format!("{v:0width$}"),
        None => "*".repeat(width),
    }
}

impl fmt::Display for BacnetDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{} {}:{}:{}.{}",
            field(self.date.year, 4),
            field(self.date.month, 2),
            field(self.date.day, 2),
            field(self.time.hour, 2),
            field(self.time.minute, 2),
            field(self.time.second, 2),
            field(self.time.hundredths, 2),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_opt(h, mi, s))
            .expect("valid test timestamp")
    }

    #[test]
    fn resolves_concrete_fields() {
        let dt = BacnetDateTime::new(BacnetDate::new(2007, 2, 27), BacnetTime::new(15, 0, 0, 0));
        assert_eq!(dt.resolve(), Some(at(2007, 2, 27, 15, 0, 0)));
        assert!(!dt.is_wildcard());
    }

    #[test]
    fn weekday_is_derived() {
        // 2007-02-27 was a Tuesday
        assert_eq!(BacnetDate::new(2007, 2, 27).weekday, Some(2));
    }

    #[test]
    fn full_wildcard_does_not_resolve() {
        let dt = BacnetDateTime::wildcard();
        assert!(dt.is_wildcard());
        assert_eq!(dt.resolve(), None);
    }

    #[test]
    fn partial_wildcard_is_not_full_wildcard() {
        let mut dt = BacnetDateTime::from_naive(at(2007, 2, 27, 15, 0, 0));
        dt.time.hour = None;
        assert!(!dt.is_wildcard());
        assert_eq!(dt.resolve(), None);
    }

    #[test]
    fn invalid_calendar_date_does_not_resolve() {
        let dt = BacnetDateTime::new(BacnetDate::new(2007, 2, 30), BacnetTime::new(0, 0, 0, 0));
        assert_eq!(dt.resolve(), None);
    }

    #[test]
    fn naive_round_trip_keeps_hundredths() {
        let naive = at(2007, 2, 27, 15, 0, 1)
            .checked_add_signed(chrono::Duration::milliseconds(250))
            .expect("in range");
        let dt = BacnetDateTime::from_naive(naive);
        assert_eq!(dt.time.hundredths, Some(25));
        assert_eq!(dt.resolve(), Some(naive));
    }

    #[test]
    fn display_marks_wildcards() {
        let dt = BacnetDateTime::wildcard();
        assert_eq!(dt.to_string(), "****-**-** **:**:**.**");
    }
}
