//! Fixed-table GMT timestamp formatting for cookie attributes.
//!
//! Cookie `Expires` values must read the same regardless of process locale,
//! so weekday and month names come from fixed English tables rather than any
//! locale-sensitive formatter.

use std::fmt;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A civil date/time in UTC.
///
/// Displays in the classic HTTP preferred form,
/// `Www, dd Mmm yyyy HH:MM:SS GMT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpDate {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
}

impl HttpDate {
    /// The fixed already-elapsed date used to drop cookies:
    /// `Thu, 01 Jan 1970 00:00:00 GMT`.
    pub const EPOCH: HttpDate = HttpDate {
        year: 1970,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Midnight on the given calendar day. Out-of-range month/day values are
    /// clamped into the calendar rather than rejected.
    #[must_use]
    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month: month.clamp(1, 12),
            day: day.clamp(1, 31),
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    /// The same day at a specific time.
    #[must_use]
    pub fn and_hms(mut self, hour: u32, minute: u32, second: u32) -> Self {
        self.hour = hour.min(23);
        self.minute = minute.min(59);
        self.second = second.min(59);
        self
    }

    /// Day of week, 0 = Sunday (Sakamoto's method).
    fn weekday_index(self) -> usize {
        const T: [i32; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
        let mut y = self.year;
        if self.month < 3 {
            y -= 1;
        }
        let m = (self.month as usize - 1).min(11);
        let d = self.day as i32;
        let w = (y + y / 4 - y / 100 + y / 400 + T[m] + d).rem_euclid(7);
        w as usize
    }
}

impl fmt::Display for HttpDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
            WEEKDAYS[self.weekday_index()],
            self.day,
            MONTHS[(self.month as usize - 1).min(11)],
            self.year,
            self.hour,
            self.minute,
            self.second,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_renders_fixed_expiry_date() {
        assert_eq!(HttpDate::EPOCH.to_string(), "Thu, 01 Jan 1970 00:00:00 GMT");
    }

    #[test]
    fn test_known_weekdays() {
        // A Saturday and a Wednesday with well-known dates.
        assert_eq!(
            HttpDate::ymd(2000, 1, 1).to_string(),
            "Sat, 01 Jan 2000 00:00:00 GMT"
        );
        assert_eq!(
            HttpDate::ymd(2015, 10, 21).to_string(),
            "Wed, 21 Oct 2015 00:00:00 GMT"
        );
    }

    #[test]
    fn test_time_of_day() {
        let dt = HttpDate::ymd(2030, 12, 31).and_hms(23, 59, 9);
        assert_eq!(dt.to_string(), "Tue, 31 Dec 2030 23:59:09 GMT");
    }

    #[test]
    fn test_day_and_month_zero_padding() {
        let dt = HttpDate::ymd(2026, 8, 3).and_hms(7, 5, 0);
        assert_eq!(dt.to_string(), "Mon, 03 Aug 2026 07:05:00 GMT");
    }

    #[test]
    fn test_out_of_range_fields_clamped() {
        let dt = HttpDate::ymd(2020, 13, 40);
        assert!(dt.to_string().contains("Dec"));
        assert!(dt.to_string().contains(" 31 "));
    }
}
