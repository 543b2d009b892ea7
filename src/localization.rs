//! Ethiopian calendar date for display.
//!
//! Simplified conversion: the Ethiopian new year falls on Gregorian 11 September, or
//! 12 September in a Gregorian leap year; months are 30 days with the short 13th month
//! (Pagume) implied by whatever days remain. Historical calendar reforms are ignored.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthiopianDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for EthiopianDate {
    /// `YYYY-MM-DD`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

pub fn is_gregorian_leap(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Gregorian date on which the Ethiopian year starting in Gregorian `year` begins.
fn new_year_anchor(year: i32) -> NaiveDate {
    let day = if is_gregorian_leap(year) { 12 } else { 11 };
    // September 11/12 exists in every proleptic Gregorian year chrono supports.
    NaiveDate::from_ymd_opt(year, 9, day).unwrap_or(NaiveDate::MIN)
}

/// Convert a calendar date (no time-of-day) to the Ethiopian calendar.
pub fn date_to_ethiopian(date: NaiveDate) -> EthiopianDate {
    let g_year = date.year();
    let this_anchor = new_year_anchor(g_year);
    let (anchor, year) = if date < this_anchor {
        (new_year_anchor(g_year - 1), g_year - 8)
    } else {
        (this_anchor, g_year - 7)
    };
    let days = (date - anchor).num_days().max(0) as u32;
    EthiopianDate {
        year,
        month: days / 30 + 1,
        day: days % 30 + 1,
    }
}

/// Convert a timestamp, using the calendar date in the timestamp's own zone.
pub fn to_ethiopian<Tz: TimeZone>(t: &DateTime<Tz>) -> EthiopianDate {
    date_to_ethiopian(t.date_naive())
}

/// Convenience for the stored `published_date_localized` field.
pub fn localized_date_string<Tz: TimeZone>(t: &DateTime<Tz>) -> String {
    to_ethiopian(t).to_string()
}
