//! Period boundary computation.
//!
//! Boundaries are naive local datetimes in the reference zone; order
//! timestamps get converted into the same zone before comparison, which
//! keeps results independent of the host time zone.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// First day of the week used for the this-week window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeekStart {
    /// ISO 8601 weeks, used by the overview rollup.
    Monday,
    /// Locale weeks, used by the detailed rollup.
    Sunday,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct PeriodBounds {
    pub day_start: NaiveDateTime,
    pub yesterday_start: NaiveDateTime,
    pub week_start: NaiveDateTime,
    pub month_start: NaiveDateTime,
    pub year_start: NaiveDateTime,
}

impl PeriodBounds {
    pub fn compute(now_local: NaiveDateTime, week_start: WeekStart) -> Self {
        let today = now_local.date();
        let day_start = today.and_time(NaiveTime::MIN);
        let days_into_week = match week_start {
            WeekStart::Monday => today.weekday().num_days_from_monday(),
            WeekStart::Sunday => today.weekday().num_days_from_sunday(),
        };
        Self {
            day_start,
            yesterday_start: day_start - Duration::days(1),
            week_start: (today - Duration::days(i64::from(days_into_week)))
                .and_time(NaiveTime::MIN),
            month_start: today.with_day(1).unwrap_or(today).and_time(NaiveTime::MIN),
            year_start: NaiveDate::from_ymd_opt(today.year(), 1, 1)
                .unwrap_or(today)
                .and_time(NaiveTime::MIN),
        }
    }
}
