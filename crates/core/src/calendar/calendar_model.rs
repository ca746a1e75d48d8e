use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;
use crate::income::{IncomeEvent, IncomeStatus};

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarMonth {
    year: i32,
    month: u32,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    fn index(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    fn from_index(index: i64) -> Self {
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Moves by `months` (negative goes back).
    pub fn shift(&self, months: i32) -> Self {
        Self::from_index(self.index() + months as i64)
    }

    pub fn previous(&self) -> Self {
        self.shift(-1)
    }

    pub fn next(&self) -> Self {
        self.shift(1)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// This month and the `count - 1` before it, oldest first.
    pub fn trailing(&self, count: u32) -> Vec<CalendarMonth> {
        (0..count as i32).rev().map(|back| self.shift(-back)).collect()
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for CalendarMonth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        CalendarMonth::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for CalendarMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which statuses the calendar shows. Both are on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusFilter {
    pub paid: bool,
    pub provisioned: bool,
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self {
            paid: true,
            provisioned: true,
        }
    }
}

impl StatusFilter {
    pub fn allows(&self, status: IncomeStatus) -> bool {
        match status {
            IncomeStatus::Paid => self.paid,
            IncomeStatus::Provisioned => self.provisioned,
        }
    }
}

/// Display order: newest date first, then ticker, then id.
pub fn display_order(a: &IncomeEvent, b: &IncomeEvent) -> Ordering {
    b.event_date
        .cmp(&a.event_date)
        .then_with(|| a.ticker.cmp(&b.ticker))
        .then_with(|| a.id.cmp(&b.id))
}

/// One slot of the month grid. Placeholders have no date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarCell {
    pub date: Option<NaiveDate>,
    pub day: Option<u32>,
    /// Events rendered in the cell, capped unless the date is expanded.
    pub events: Vec<IncomeEvent>,
    /// Visible events on the date, including the ones not rendered.
    pub total_events: usize,
    pub hidden_events: usize,
    pub is_expanded: bool,
}

impl CalendarCell {
    pub fn placeholder() -> Self {
        Self {
            date: None,
            day: None,
            events: Vec::new(),
            total_events: 0,
            hidden_events: 0,
            is_expanded: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.date.is_none()
    }
}

/// Totals over the visible events of a month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub event_count: usize,
    pub ticker_count: usize,
    pub paid_gross: Decimal,
    pub provisioned_gross: Decimal,
    pub total_net: Decimal,
}

/// Sunday-first, seven-column grid for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGrid {
    pub month: CalendarMonth,
    pub status_filter: StatusFilter,
    pub cells: Vec<CalendarCell>,
    pub summary: MonthSummary,
}

impl MonthGrid {
    pub const COLUMNS: usize = 7;

    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(Self::COLUMNS)
    }

    pub fn cell_for(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.cells.iter().find(|c| c.date == Some(date))
    }
}
