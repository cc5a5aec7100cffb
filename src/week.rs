//! Calendar-week bucketing relative to a fixed epoch.

use chrono::{NaiveDate, TimeDelta};

/// Week zero starts on the service's founding date (2010-10-06).
pub const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2010, 10, 6) {
    Some(date) => date,
    None => panic!("invalid epoch"),
};

/// Index of the 7-day window containing `date`, counted from [`EPOCH`].
///
/// Dates before the epoch produce negative indices (floor division).
#[inline]
pub fn week_index(date: NaiveDate) -> i64 {
    (date - EPOCH).num_days().div_euclid(7)
}

/// First day of the window with the given index, if it is a representable date.
pub fn week_start(index: i64) -> Option<NaiveDate> {
    let offset = TimeDelta::try_days(index.checked_mul(7)?)?;
    EPOCH.checked_add_signed(offset)
}

/// Whole days from `first` to `last`.
#[inline]
pub fn days_between(first: NaiveDate, last: NaiveDate) -> i64 {
    (last - first).num_days()
}
