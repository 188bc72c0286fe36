use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::TrackerError;
use crate::models::MeasurementRecord;

/// Half-open `[start, end)` interval in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp < self.end
    }

    pub fn select<'a>(
        &self,
        records: &'a [MeasurementRecord],
    ) -> impl Iterator<Item = &'a MeasurementRecord> + 'a {
        let window = *self;
        records
            .iter()
            .filter(move |record| window.contains(record.timestamp))
    }
}

pub fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn out_of_range(date: NaiveDate) -> TrackerError {
    TrackerError::DateOutOfRange(date.to_string())
}

fn days_back(date: NaiveDate, days: u64) -> Result<NaiveDate, TrackerError> {
    date.checked_sub_days(Days::new(days))
        .ok_or_else(|| out_of_range(date))
}

/// Sunday on or before `date`.
pub fn start_of_week(date: NaiveDate) -> Result<NaiveDate, TrackerError> {
    days_back(date, u64::from(date.weekday().num_days_from_sunday()))
}

pub fn week_of(date: NaiveDate) -> Result<Window, TrackerError> {
    let start = start_of_week(date)?;
    let end = start
        .checked_add_days(Days::new(7))
        .ok_or_else(|| out_of_range(date))?;
    Ok(Window::new(midnight(start), midnight(end)))
}

pub fn current_week(now: DateTime<Utc>) -> Result<Window, TrackerError> {
    week_of(now.date_naive())
}

/// The week `weeks_back` weeks before the current one; zero is the current week.
pub fn week_offset(now: DateTime<Utc>, weeks_back: u32) -> Result<Window, TrackerError> {
    week_of(days_back(now.date_naive(), u64::from(weeks_back) * 7)?)
}

pub fn last_week(now: DateTime<Utc>) -> Result<Window, TrackerError> {
    week_offset(now, 1)
}

fn first_of_month(date: NaiveDate) -> Result<NaiveDate, TrackerError> {
    days_back(date, u64::from(date.day0()))
}

fn month_of(date: NaiveDate) -> Result<Window, TrackerError> {
    let first = first_of_month(date)?;
    let end = first
        .checked_add_months(Months::new(1))
        .ok_or_else(|| out_of_range(date))?;
    Ok(Window::new(midnight(first), midnight(end)))
}

/// The calendar month `months_back` months before the current one.
pub fn month_offset(now: DateTime<Utc>, months_back: u32) -> Result<Window, TrackerError> {
    let first = first_of_month(now.date_naive())?;
    let target = first
        .checked_sub_months(Months::new(months_back))
        .ok_or_else(|| out_of_range(first))?;
    month_of(target)
}

pub fn this_month(now: DateTime<Utc>) -> Result<Window, TrackerError> {
    month_offset(now, 0)
}

/// Comparison period of a fat-loss leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    LastWeek,
    /// Week of the earliest body-composition record on file.
    InitialWeek,
    Anchor(NaiveDate),
}

impl Baseline {
    /// `Ok(None)` when the baseline depends on history that does not exist yet.
    pub fn window(
        &self,
        now: DateTime<Utc>,
        earliest: Option<DateTime<Utc>>,
    ) -> Result<Option<Window>, TrackerError> {
        match self {
            Baseline::LastWeek => last_week(now).map(Some),
            Baseline::InitialWeek => earliest.map(|ts| week_of(ts.date_naive())).transpose(),
            Baseline::Anchor(date) => week_of(*date)
                .map(Some)
                .map_err(|_| TrackerError::InvalidBaseline(date.to_string())),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Baseline::LastWeek => "last week".to_string(),
            Baseline::InitialWeek => "initial week".to_string(),
            Baseline::Anchor(date) => {
                format!("week of {}", start_of_week(*date).unwrap_or(*date))
            }
        }
    }
}

impl FromStr for Baseline {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-week" => Ok(Baseline::LastWeek),
            "initial" => Ok(Baseline::InitialWeek),
            other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
                .map(Baseline::Anchor)
                .map_err(|_| TrackerError::InvalidBaseline(other.to_string())),
        }
    }
}
