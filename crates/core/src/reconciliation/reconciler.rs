//! Pure reconciliation steps: raw records to a renderable view.

use log::debug;

use super::{IncomeCalendarView, ReconciledSnapshot, ViewKey, ViewState};
use crate::calendar::{build_month_grid, display_order, resolve_scope, visible_events};
use crate::income::{
    deduplicate_events, normalize_events, IncomeEvent, NormalizationContext, PositionLookup,
    RawIncomeEvent,
};
use crate::insights::{compute_ticker_insights, insight_months};

/// Normalizes and deduplicates `raws`, returning events in display order.
pub fn reconcile_events(
    raws: &[RawIncomeEvent],
    ctx: &NormalizationContext<'_>,
) -> Vec<IncomeEvent> {
    let normalized = normalize_events(raws, ctx);
    let mut events = deduplicate_events(&normalized);
    events.sort_by(display_order);
    debug!(
        "Reconciled {} raw records into {} events",
        raws.len(),
        events.len()
    );
    events
}

/// Runs the whole pipeline for `key` over already fetched records.
///
/// Insights only see events inside `insight_months` of the reference date, so
/// extra months loaded for display never change them.
pub fn reconcile_snapshot(
    key: ViewKey,
    raws: &[RawIncomeEvent],
    positions: &PositionLookup,
    base_currency: &str,
) -> ReconciledSnapshot {
    let ctx = NormalizationContext {
        reference_date: key.reference_date,
        base_currency,
        positions,
    };
    let events = reconcile_events(raws, &ctx);

    let horizon = insight_months(key.reference_date);
    let insight_events: Vec<IncomeEvent> = events
        .iter()
        .filter(|e| horizon.iter().any(|m| m.contains(e.event_date)))
        .cloned()
        .collect();
    let insights = compute_ticker_insights(&insight_events, key.reference_date, positions);
    ReconciledSnapshot {
        key,
        events,
        insights,
    }
}

/// Derives the view for `snapshot` under `state`.
///
/// The grid and the detail scope only ever see events of the displayed month
/// that pass the status filter.
pub fn build_view(
    snapshot: &ReconciledSnapshot,
    state: &ViewState,
    preview_limit: usize,
) -> IncomeCalendarView {
    let month = snapshot.key.month;
    let grid = build_month_grid(
        &snapshot.events,
        month,
        state.status_filter,
        &state.expanded_dates,
        preview_limit,
    );
    let visible = visible_events(&snapshot.events, month, state.status_filter);
    let scope = resolve_scope(&visible, &state.selection);

    IncomeCalendarView {
        portfolio_id: snapshot.key.portfolio_id.clone(),
        month,
        reference_date: snapshot.key.reference_date,
        status_filter: state.status_filter,
        selection: state.selection.clone(),
        expanded_dates: state.expanded_dates.clone(),
        events: snapshot.events.clone(),
        grid,
        insights: snapshot.insights.clone(),
        scope,
    }
}
