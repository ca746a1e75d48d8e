//! Detail-list scope for the calendar view.
//!
//! A selected event narrows the list to that event, a selected day narrows it
//! to the day, and no selection shows everything visible. Resolution never
//! mutates the events it is given.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::display_order;
use crate::income::IncomeEvent;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSelection {
    pub date: Option<NaiveDate>,
    pub event_id: Option<String>,
}

impl ViewSelection {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.event_id.is_none()
    }

    /// Selects a day and drops any event selection.
    pub fn select_date(&mut self, date: NaiveDate) {
        self.date = Some(date);
        self.event_id = None;
    }

    /// Selects an event and its day. Selecting the selected event again goes
    /// back to the day scope.
    pub fn toggle_event(&mut self, event: &IncomeEvent) {
        if self.event_id.as_deref() == Some(event.id.as_str()) {
            self.event_id = None;
        } else {
            self.event_id = Some(event.id.clone());
        }
        self.date = Some(event.event_date);
    }

    pub fn clear(&mut self) {
        self.date = None;
        self.event_id = None;
    }
}

/// Events to list for `selection`, in display order.
///
/// An event id that is not among `events` (filtered out, or gone after a
/// refetch) falls back to the date scope.
pub fn resolve_scope(events: &[IncomeEvent], selection: &ViewSelection) -> Vec<IncomeEvent> {
    if let Some(event_id) = selection.event_id.as_deref() {
        if let Some(event) = events.iter().find(|e| e.id == event_id) {
            return vec![event.clone()];
        }
    }

    let mut scoped: Vec<IncomeEvent> = match selection.date {
        Some(date) => events
            .iter()
            .filter(|e| e.event_date == date)
            .cloned()
            .collect(),
        None => events.to_vec(),
    };
    scoped.sort_by(display_order);
    scoped
}
