//! Month-relative reporting weeks.
//!
//! Reporting weeks run Saturday to Friday. Week 1 of a month is the week
//! containing the 1st, even when that week starts in the previous month.
//! Such a week is a *cross-month* week: it is addressed by the month it spills
//! into but belongs to the month holding its Saturday, so every calendar week
//! has exactly one canonical [`WeekKey`].

use crate::utils::error::{ReportError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Weeks 1..=6: a month not starting on a Saturday can have its fifth
/// Saturday in week 6.
pub const MAX_WEEKS_IN_MONTH: u32 = 6;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// Inclusive Saturday..Friday span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    fn week_starting(start: NaiveDate) -> Self {
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A reporting bucket: (year, month, week-in-month).
///
/// Serialized as its report id, e.g. `2025-08-W02`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekKey {
    year: i32,
    month: u32,
    week: u32,
}

impl WeekKey {
    pub fn new(year: i32, month: u32, week: u32) -> Result<Self> {
        first_of_month(year, month)?;
        if week == 0 || week > MAX_WEEKS_IN_MONTH {
            return Err(ReportError::InvalidWeekNumber {
                week,
                max: MAX_WEEKS_IN_MONTH,
            });
        }
        Ok(Self { year, month, week })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn range(&self) -> DateRange {
        let start = first_week_start(self.year, self.month) + Duration::weeks(i64::from(self.week - 1));
        DateRange::week_starting(start)
    }

    pub fn is_cross_month(&self) -> bool {
        self.range().start.month() != self.month
    }

    /// `YYYY-MM-WNN`, the id stored reports are keyed by.
    pub fn report_id(&self) -> String {
        self.to_string()
    }

    /// Column label for tables, e.g. `Aug W02 (08/02-08/08)`.
    pub fn label(&self) -> String {
        let range = self.range();
        let month_name = first_of_month(self.year, self.month)
            .map(|first| first.format("%b").to_string())
            .unwrap_or_default();
        format!(
            "{} W{:02} ({}-{})",
            month_name,
            self.week,
            range.start.format("%m/%d"),
            range.end.format("%m/%d")
        )
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-W{:02}", self.year, self.month, self.week)
    }
}

impl FromStr for WeekKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ReportError::InvalidReportId(s.to_string());

        let mut parts = s.splitn(3, '-');
        let (year, month, week) = match (parts.next(), parts.next(), parts.next()) {
            (Some(y), Some(m), Some(w)) => (y, m, w),
            _ => return Err(invalid()),
        };
        let week = week.strip_prefix('W').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 || week.len() != 2 {
            return Err(invalid());
        }

        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        let week = week.parse().map_err(|_| invalid())?;
        WeekKey::new(year, month, week)
    }
}

impl TryFrom<String> for WeekKey {
    type Error = ReportError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<WeekKey> for String {
    fn from(key: WeekKey) -> Self {
        key.to_string()
    }
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    if !(1..=12).contains(&month) {
        return Err(ReportError::InvalidMonth(month));
    }
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ReportError::InvalidDate(format!(
            "year {} outside {}..={}",
            year, MIN_YEAR, MAX_YEAR
        )));
    }
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ReportError::InvalidDate(format!("{:04}-{:02}-01", year, month)))
}

fn last_of_month(first: NaiveDate) -> NaiveDate {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    match next {
        Some(next) => next - Duration::days(1),
        None => first + Duration::days(30),
    }
}

/// Saturday on or before `date`: Sunday steps back 1 day, Friday steps back 6.
fn saturday_on_or_before(date: NaiveDate) -> NaiveDate {
    let back = (date.weekday().num_days_from_sunday() + 1) % 7;
    date - Duration::days(i64::from(back))
}

// Callers validate year/month through WeekKey::new or first_of_month.
fn first_week_start(year: i32, month: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default();
    saturday_on_or_before(first)
}

/// Date range of week `week_in_month` of the given month.
pub fn resolve_week(year: i32, month: u32, week_in_month: u32) -> Result<DateRange> {
    Ok(WeekKey::new(year, month, week_in_month)?.range())
}

/// True when the week starts in a different month than `month`.
pub fn is_cross_month_week(year: i32, month: u32, week_in_month: u32) -> Result<bool> {
    Ok(WeekKey::new(year, month, week_in_month)?.is_cross_month())
}

/// Week numbers belonging wholly to the month, ascending.
///
/// At most five numbers, but they can run up to week 6 when week 1 starts
/// in the previous month: August 2025 yields `[2, 3, 4, 5, 6]`.
pub fn get_valid_weeks_in_month(year: i32, month: u32) -> Result<Vec<u32>> {
    Ok(valid_week_keys_in_month(year, month)?
        .into_iter()
        .map(|key| key.week())
        .collect())
}

pub fn valid_week_keys_in_month(year: i32, month: u32) -> Result<Vec<WeekKey>> {
    Ok(week_keys_in_month(year, month)?
        .into_iter()
        .filter(|key| !key.is_cross_month())
        .collect())
}

/// Every week touching the month, cross-month week 1 included.
pub fn week_keys_in_month(year: i32, month: u32) -> Result<Vec<WeekKey>> {
    let first = first_of_month(year, month)?;
    let last_week_start = saturday_on_or_before(last_of_month(first));
    let first_week_start = saturday_on_or_before(first);

    let span = (last_week_start - first_week_start).num_days();
    let week_count = ((span as f64 / 7.0).round() as u32 + 1).min(MAX_WEEKS_IN_MONTH);

    (1..=week_count)
        .map(|week| WeekKey::new(year, month, week))
        .collect()
}

/// Canonical bucket of `date`: the week whose Saturday is on or before it,
/// addressed in the month holding that Saturday.
pub fn week_key_for_date(date: NaiveDate) -> Result<WeekKey> {
    let saturday = saturday_on_or_before(date);
    let (year, month) = (saturday.year(), saturday.month());
    first_of_month(year, month)?;

    let weeks_after_first = (saturday - first_week_start(year, month)).num_weeks();
    WeekKey::new(year, month, weeks_after_first as u32 + 1)
}
