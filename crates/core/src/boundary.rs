//! Calendar-day boundaries in the reference timezone

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// First year the scheduler accepts. Stored dates sort as text inside this range.
pub const MIN_YEAR: i32 = 1;
/// Last year the scheduler accepts
pub const MAX_YEAR: i32 = 9999;

/// The calendar date `now` falls on in `tz`
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// First instant of `date` in `tz`.
///
/// When local midnight does not exist (a DST jump at 00:00) the first valid
/// hour is used; when it exists twice the earlier one wins.
pub fn start_of_day(tz: Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    (0..=3).find_map(|hour| {
        let local = date.and_hms_opt(hour, 0, 0)?;
        tz.from_local_datetime(&local)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
    })
}

/// Next local midnight strictly after `now`
pub fn next_boundary(tz: Tz, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let tomorrow = today_in(tz, now).succ_opt()?;
    start_of_day(tz, tomorrow)
}

/// Time left until the next local midnight, never negative
pub fn until_next_boundary(tz: Tz, now: DateTime<Utc>) -> Option<Duration> {
    let next = next_boundary(tz, now)?;
    Some((next - now).max(Duration::zero()))
}

/// Reject dates outside `MIN_YEAR..=MAX_YEAR`
pub fn ensure_supported(date: NaiveDate) -> Result<NaiveDate> {
    if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        Ok(date)
    } else {
        Err(Error::Validation(format!(
            "Date {date} is outside the supported range (years {MIN_YEAR} to {MAX_YEAR})"
        )))
    }
}

/// `date` moved by `days`, saturating at the ends of the calendar
pub fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    let moved = Duration::try_days(days).and_then(|delta| date.checked_add_signed(delta));
    match moved {
        Some(d) => d,
        None if days < 0 => NaiveDate::MIN,
        None => NaiveDate::MAX,
    }
}
