//! Semi-monthly pay periods.
//!
//! Every calendar month is split into two windows: the 1st through the 14th,
//! and the 15th through the last day of the month. All times are wall-clock
//! times in the company's local calendar; callers convert "now" to a local
//! date before asking which period it falls in.

use core::iter;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// First day of the second half of a month.
const SECOND_HALF_START_DAY: u32 = 15;

/// Which half of the month a period covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodHalf {
    /// Days 1-14.
    First,
    /// Day 15 through month end.
    Second,
}

/// Whether a period still accepts time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    /// The period has not ended yet.
    Open,
    /// The last millisecond of the period has passed.
    Closed,
}

/// An inclusive pay period window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Midnight at the start of the first day.
    pub start: NaiveDateTime,
    /// 23:59:59.999 on the last day.
    pub end: NaiveDateTime,
}

/// Compute the pay period enclosing `reference`.
///
/// ```
/// use chrono::NaiveDate;
/// use tally_core::period::period_containing;
///
/// let leap = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
/// let period = period_containing(leap);
/// assert_eq!(period.start_date(), leap);
/// assert_eq!(period.end_date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
/// ```
#[must_use]
pub fn period_containing(reference: NaiveDate) -> PayPeriod {
    let day = reference.day();
    let (first_day, last_day) = if day < SECOND_HALF_START_DAY {
        (1, SECOND_HALF_START_DAY - 1)
    } else {
        (
            SECOND_HALF_START_DAY,
            days_in_month(reference.year(), reference.month()),
        )
    };

    // Both days exist in the reference month, so neither lookup can fail.
    let start_date = reference.with_day(first_day).unwrap_or(reference);
    let end_date = reference.with_day(last_day).unwrap_or(reference);

    PayPeriod {
        start: start_of_day(start_date),
        end: end_of_day(end_date),
    }
}

impl PayPeriod {
    /// Whether `instant` falls inside the period, inclusive at both ends.
    #[must_use]
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Whether any part of `date` falls inside the period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start_date() <= date && date <= self.end_date()
    }

    /// First calendar day of the period.
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Last calendar day of the period.
    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    /// Which half of the month this period covers.
    #[must_use]
    pub fn half(&self) -> PeriodHalf {
        if self.start_date().day() < SECOND_HALF_START_DAY {
            PeriodHalf::First
        } else {
            PeriodHalf::Second
        }
    }

    /// Number of calendar days covered.
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end_date() - self.start_date()).num_days() + 1
    }

    /// The period immediately after this one, or `None` at the end of the
    /// representable calendar.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        self.end_date().succ_opt().map(period_containing)
    }

    /// The period immediately before this one, or `None` at the start of the
    /// representable calendar.
    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        self.start_date().pred_opt().map(period_containing)
    }

    /// `Closed` once `now` is past the end of the period.
    #[must_use]
    pub fn status(&self, now: NaiveDateTime) -> PeriodStatus {
        if now > self.end {
            PeriodStatus::Closed
        } else {
            PeriodStatus::Open
        }
    }
}

/// The Monday-to-Sunday week containing `date`.
///
/// `None` only for the partial weeks at either end of the calendar.
#[must_use]
pub fn week_days(date: NaiveDate) -> Option<[NaiveDate; 7]> {
    let back = Days::new(u64::from(date.weekday().num_days_from_monday()));
    let monday = date.checked_sub_days(back)?;
    let week: Vec<NaiveDate> = iter::successors(Some(monday), NaiveDate::succ_opt)
        .take(7)
        .collect();
    week.try_into().ok()
}

/// Number of days in `month` of `year`, accounting for leap years.
#[must_use]
pub const fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| unreachable!())
}
