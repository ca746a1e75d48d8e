//! Month grid aggregation.

use chrono::{Datelike, NaiveDate};
use log::warn;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::{display_order, CalendarCell, CalendarMonth, MonthGrid, MonthSummary, StatusFilter};
use crate::income::{IncomeEvent, IncomeStatus};

/// Events of `month` whose status the filter lets through, in display order.
pub fn visible_events(
    events: &[IncomeEvent],
    month: CalendarMonth,
    filter: StatusFilter,
) -> Vec<IncomeEvent> {
    let mut visible: Vec<IncomeEvent> = events
        .iter()
        .filter(|e| month.contains(e.event_date) && filter.allows(e.status))
        .cloned()
        .collect();
    visible.sort_by(display_order);
    visible
}

pub fn summarize(events: &[IncomeEvent]) -> MonthSummary {
    let mut summary = MonthSummary {
        event_count: events.len(),
        ..Default::default()
    };
    let mut tickers = HashSet::new();

    for event in events {
        tickers.insert(event.ticker.as_str());
        let gross = event.expected_gross.unwrap_or(Decimal::ZERO);
        let gross_total = match event.status {
            IncomeStatus::Paid => &mut summary.paid_gross,
            IncomeStatus::Provisioned => &mut summary.provisioned_gross,
        };
        let net = event.expected_net.unwrap_or(Decimal::ZERO);
        match (gross_total.checked_add(gross), summary.total_net.checked_add(net)) {
            (Some(gross_sum), Some(net_sum)) => {
                *gross_total = gross_sum;
                summary.total_net = net_sum;
            }
            _ => warn!("Month summary overflowed, skipping amounts of {}", event.id),
        }
    }
    summary.ticker_count = tickers.len();
    summary
}

/// Builds the Sunday-first grid for `month`.
///
/// Leading placeholders fill the days before the 1st, trailing ones pad the
/// last week, so the cell count is always a multiple of seven. Each cell shows
/// at most `preview_limit` events unless its date is in `expanded_dates`.
pub fn build_month_grid(
    events: &[IncomeEvent],
    month: CalendarMonth,
    filter: StatusFilter,
    expanded_dates: &BTreeSet<NaiveDate>,
    preview_limit: usize,
) -> MonthGrid {
    let visible = visible_events(events, month, filter);

    let mut by_day: BTreeMap<NaiveDate, Vec<IncomeEvent>> = BTreeMap::new();
    for event in &visible {
        by_day.entry(event.event_date).or_default().push(event.clone());
    }

    let first_day = month.first_day();
    let leading = first_day.weekday().num_days_from_sunday() as usize;
    let days = month.days_in_month() as usize;
    let total = (leading + days).div_ceil(MonthGrid::COLUMNS) * MonthGrid::COLUMNS;

    let mut cells = Vec::with_capacity(total);
    cells.extend((0..leading).map(|_| CalendarCell::placeholder()));

    for date in first_day.iter_days().take(days) {
        let mut day_events = by_day.remove(&date).unwrap_or_default();
        day_events.sort_by(|a, b| a.ticker.cmp(&b.ticker).then_with(|| a.id.cmp(&b.id)));

        let is_expanded = expanded_dates.contains(&date);
        let total_events = day_events.len();
        if !is_expanded {
            day_events.truncate(preview_limit);
        }

        cells.push(CalendarCell {
            date: Some(date),
            day: Some(date.day()),
            hidden_events: total_events - day_events.len(),
            total_events,
            events: day_events,
            is_expanded,
        });
    }

    while cells.len() < total {
        cells.push(CalendarCell::placeholder());
    }

    MonthGrid {
        month,
        status_filter: filter,
        summary: summarize(&visible),
        cells,
    }
}
