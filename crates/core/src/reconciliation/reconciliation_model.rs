use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::calendar::{CalendarMonth, MonthGrid, StatusFilter, ViewSelection};
use crate::income::IncomeEvent;
use crate::insights::TickerInsight;

/// Identity of one reconciliation request. A fetched result is only committed
/// while the active key still equals the key it was requested under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewKey {
    pub portfolio_id: String,
    pub month: CalendarMonth,
    pub reference_date: NaiveDate,
}

/// User-controlled presentation state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub status_filter: StatusFilter,
    pub selection: ViewSelection,
    pub expanded_dates: BTreeSet<NaiveDate>,
}

impl ViewState {
    /// Expands `date` if collapsed, collapses it otherwise.
    pub fn toggle_expanded(&mut self, date: NaiveDate) {
        if !self.expanded_dates.remove(&date) {
            self.expanded_dates.insert(date);
        }
    }

    /// Forgets selection and expansion, keeping the status filter.
    pub fn reset_navigation(&mut self) {
        self.selection.clear();
        self.expanded_dates.clear();
    }
}

/// Deduplicated events and insights for one committed request.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledSnapshot {
    pub key: ViewKey,
    pub events: Vec<IncomeEvent>,
    pub insights: BTreeMap<String, TickerInsight>,
}

/// Everything the renderer needs for one screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeCalendarView {
    pub portfolio_id: String,
    pub month: CalendarMonth,
    pub reference_date: NaiveDate,
    pub status_filter: StatusFilter,
    pub selection: ViewSelection,
    pub expanded_dates: BTreeSet<NaiveDate>,
    /// Deduplicated events across every loaded month.
    pub events: Vec<IncomeEvent>,
    pub grid: MonthGrid,
    pub insights: BTreeMap<String, TickerInsight>,
    /// Detail list for the current selection.
    pub scope: Vec<IncomeEvent>,
}
