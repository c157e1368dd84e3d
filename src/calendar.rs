//! Calendar reconstruction from raw day columns of unknown encoding.
//!
//! The raw "day" column of a station sheet may hold day-of-year numbers,
//! full date strings, or bare day-of-month numbers that silently roll
//! over into the next month. Each interpretation is a [`CalendarStrategy`]
//! tried in a fixed order against the whole column; the first one that
//! declares itself applicable produces every date. Nothing here fails:
//! the last strategy always applies and degrades to a best-effort answer.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// A raw value from the day column, before any interpretation
#[derive(Debug, Clone, PartialEq)]
pub enum RawDay {
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Missing,
}

impl RawDay {
    /// Numeric reading of the value, text is parsed after trimming
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawDay::Number(n) if n.is_finite() => Some(*n),
            RawDay::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Date reading of the value, numbers are never dates
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            RawDay::Date(d) => Some(*d),
            RawDay::Text(s) => parse_date_text(s),
            _ => None,
        }
    }
}

impl From<&str> for RawDay {
    fn from(value: &str) -> Self {
        if value.trim().is_empty() {
            RawDay::Missing
        } else {
            RawDay::Text(value.to_string())
        }
    }
}

impl From<f64> for RawDay {
    fn from(value: f64) -> Self {
        RawDay::Number(value)
    }
}

impl From<Option<&str>> for RawDay {
    fn from(value: Option<&str>) -> Self {
        value.map(RawDay::from).unwrap_or(RawDay::Missing)
    }
}

/// Day-first formats first: the station sheets are Brazilian
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"];

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

static MONTH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(jan|fev|feb|mar|abr|apr|mai|may|jun|jul|ago|aug|set|sep|out|oct|nov|dez|dec)",
    )
    .expect("month name pattern is valid")
});

/// Month number from a numeric value or a Portuguese/English abbreviation
pub fn parse_month(raw: &RawDay) -> Option<u32> {
    if let Some(n) = raw.as_number() {
        return Some(n.round().clamp(1.0, 12.0) as u32);
    }
    let RawDay::Text(text) = raw else {
        return None;
    };
    let captures = MONTH_NAME.captures(text)?;
    let month = match captures[1].to_lowercase().as_str() {
        "jan" => 1,
        "fev" | "feb" => 2,
        "mar" => 3,
        "abr" | "apr" => 4,
        "mai" | "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "ago" | "aug" => 8,
        "set" | "sep" => 9,
        "out" | "oct" => 10,
        "nov" => 11,
        _ => 12,
    };
    Some(month)
}

/// One interpretation of a raw day column
pub trait CalendarStrategy: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Dates for every row, or `None` when this interpretation does not apply
    fn attempt(&self, raw: &[RawDay], year: i32) -> Option<Vec<Option<NaiveDate>>>;
}

/// Every numeric value is a day of year in [1, 366]
#[derive(Debug, Clone, Copy, Default)]
pub struct DayOfYearStrategy;

impl CalendarStrategy for DayOfYearStrategy {
    fn name(&self) -> &'static str {
        "day-of-year"
    }

    fn attempt(&self, raw: &[RawDay], year: i32) -> Option<Vec<Option<NaiveDate>>> {
        let numbers: Vec<Option<f64>> = raw.iter().map(RawDay::as_number).collect();
        let mut parsed = numbers.iter().flatten().peekable();
        parsed.peek()?;
        if !parsed.all(|n| (1.0..=366.0).contains(n)) {
            return None;
        }

        let new_year = NaiveDate::from_ymd_opt(year, 1, 1)?;
        Some(
            numbers
                .into_iter()
                .map(|n| {
                    n.and_then(|n| new_year.checked_add_days(Days::new((n - 1.0).floor() as u64)))
                })
                .collect(),
        )
    }
}

/// More than half the rows parse as explicit dates
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitDateStrategy;

impl CalendarStrategy for ExplicitDateStrategy {
    fn name(&self) -> &'static str {
        "explicit-date"
    }

    fn attempt(&self, raw: &[RawDay], _year: i32) -> Option<Vec<Option<NaiveDate>>> {
        let dates: Vec<Option<NaiveDate>> = raw.iter().map(RawDay::as_date).collect();
        let parsed = dates.iter().filter(|d| d.is_some()).count();
        // Unparsable rows stay missing, no date is invented for them
        (parsed * 2 > raw.len()).then_some(dates)
    }
}

/// Month counter for day-of-month columns: a day smaller than its
/// predecessor means the sheet moved on to the next month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthTracker {
    month: u32,
    previous_day: Option<i64>,
}

impl Default for MonthTracker {
    fn default() -> Self {
        Self {
            month: 1,
            previous_day: None,
        }
    }
}

impl MonthTracker {
    /// Feed the next day value and get the month it belongs to
    pub fn advance(&mut self, day: i64) -> u32 {
        if self.previous_day.is_some_and(|previous| day < previous) {
            self.month = (self.month + 1).min(12);
        }
        self.previous_day = Some(day);
        self.month
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

fn day_values(raw: &[RawDay]) -> Vec<i64> {
    raw.iter()
        .map(|r| r.as_number().map(|n| n.floor() as i64).unwrap_or(1))
        .collect()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        year.checked_add(1).and_then(|next_year| NaiveDate::from_ymd_opt(next_year, 1, 1))
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map(|d| d.day()).unwrap_or(28)
}

fn build_date(year: i32, month: u32, day: i64) -> Option<NaiveDate> {
    let month = month.clamp(1, 12);
    let day = day.clamp(1, i64::from(days_in_month(year, month))) as u32;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Explicit month column supplied alongside a day-of-month column.
///
/// Applies when the month column resolves for more than half the rows
/// and no numeric day exceeds 31.
#[derive(Debug, Clone, Default)]
pub struct MonthColumnStrategy {
    months: Vec<Option<u32>>,
}

impl MonthColumnStrategy {
    pub fn new(months: &[RawDay]) -> Self {
        Self {
            months: months.iter().map(parse_month).collect(),
        }
    }
}

impl CalendarStrategy for MonthColumnStrategy {
    fn name(&self) -> &'static str {
        "month-column"
    }

    fn attempt(&self, raw: &[RawDay], year: i32) -> Option<Vec<Option<NaiveDate>>> {
        let resolved = self.months.iter().filter(|m| m.is_some()).count();
        if self.months.len() != raw.len() || resolved * 2 <= raw.len() {
            return None;
        }
        let mut numbers = raw.iter().filter_map(RawDay::as_number).peekable();
        numbers.peek()?;
        if numbers.any(|n| n > 31.0) {
            return None;
        }
        let mut tracker = MonthTracker::default();
        Some(
            day_values(raw)
                .into_iter()
                .zip(&self.months)
                .map(|(day, hint)| {
                    let inferred = tracker.advance(day);
                    build_date(year, hint.unwrap_or(inferred), day)
                })
                .collect(),
        )
    }
}

/// Day-of-month values with month boundaries inferred from wraps.
/// Always applicable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialDayOfMonthStrategy;

impl CalendarStrategy for SequentialDayOfMonthStrategy {
    fn name(&self) -> &'static str {
        "sequential-day-of-month"
    }

    fn attempt(&self, raw: &[RawDay], year: i32) -> Option<Vec<Option<NaiveDate>>> {
        let mut tracker = MonthTracker::default();
        Some(
            day_values(raw)
                .into_iter()
                .map(|day| build_date(year, tracker.advance(day), day))
                .collect(),
        )
    }
}

/// Result of a reconstruction, with the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    pub dates: Vec<Option<NaiveDate>>,
    pub strategy: &'static str,
}

/// Ordered list of strategies, first applicable wins
#[derive(Debug)]
pub struct CalendarReconstructor {
    strategies: Vec<Box<dyn CalendarStrategy + Send + Sync>>,
}

impl Default for CalendarReconstructor {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarReconstructor {
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(DayOfYearStrategy),
                Box::new(ExplicitDateStrategy),
                Box::new(SequentialDayOfMonthStrategy),
            ],
        }
    }

    /// Read day values as days of the month given by a separate month
    /// column, ahead of the day-of-year reading
    pub fn with_month_column(months: &[RawDay]) -> Self {
        Self {
            strategies: vec![
                Box::new(MonthColumnStrategy::new(months)),
                Box::new(DayOfYearStrategy),
                Box::new(ExplicitDateStrategy),
                Box::new(SequentialDayOfMonthStrategy),
            ],
        }
    }

    pub fn reconstruct(&self, raw: &[RawDay], year: i32) -> Reconstruction {
        for strategy in &self.strategies {
            if let Some(dates) = strategy.attempt(raw, year) {
                debug!(
                    "Calendar strategy '{}' applied to {} rows",
                    strategy.name(),
                    raw.len()
                );
                return Reconstruction {
                    dates,
                    strategy: strategy.name(),
                };
            }
        }
        // Unreachable with the standard list, the sequential strategy always applies
        Reconstruction {
            dates: vec![None; raw.len()],
            strategy: "none",
        }
    }
}

/// One calendar date per raw day value
pub fn reconstruct_calendar(raw: &[RawDay], year: i32) -> Vec<Option<NaiveDate>> {
    CalendarReconstructor::new().reconstruct(raw, year).dates
}
