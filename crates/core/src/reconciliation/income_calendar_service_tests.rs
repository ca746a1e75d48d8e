//! Tests for IncomeCalendarService: month caching, invalidation, stale
//! response handling and view-state transitions.

use super::*;
use crate::calendar::{CalendarMonth, StatusFilter};
use crate::config::IncomeCalendarConfig;
use crate::errors::{Error, Result, ValidationError};
use crate::income::{HeldPosition, HoldingStatus, IncomeStatus, RawIncomeEvent};
use crate::provider::{IncomeEventProviderTrait, PositionProviderTrait};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

// =========================================================================
// Mocks
// =========================================================================

#[derive(Default)]
struct MockEventProvider {
    months: Mutex<HashMap<CalendarMonth, Vec<RawIncomeEvent>>>,
    failing: Mutex<HashSet<CalendarMonth>>,
    calls: Mutex<Vec<(String, CalendarMonth)>>,
    // When set, fetches announce themselves on `started` and use up one
    // permit before answering.
    gate: Option<(Arc<Notify>, Arc<Semaphore>)>,
}

impl MockEventProvider {
    fn new() -> Self {
        Self::default()
    }

    fn gated(started: Arc<Notify>, release: Arc<Semaphore>) -> Self {
        Self {
            gate: Some((started, release)),
            ..Self::default()
        }
    }

    fn with_month(self, month: CalendarMonth, records: Vec<RawIncomeEvent>) -> Self {
        self.months.lock().unwrap().insert(month, records);
        self
    }

    fn set_failing(&self, month: CalendarMonth, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(month);
        } else {
            set.remove(&month);
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn calls_for(&self, month: CalendarMonth) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, m)| *m == month)
            .count()
    }
}

#[async_trait]
impl IncomeEventProviderTrait for MockEventProvider {
    async fn fetch_month(
        &self,
        portfolio_id: &str,
        month: CalendarMonth,
    ) -> Result<Vec<RawIncomeEvent>> {
        self.calls
            .lock()
            .unwrap()
            .push((portfolio_id.to_string(), month));

        if let Some((started, release)) = self.gate.as_ref() {
            started.notify_one();
            release
                .acquire()
                .await
                .map_err(|e| Error::Provider(e.to_string()))?
                .forget();
        }

        if self.failing.lock().unwrap().contains(&month) {
            return Err(Error::Provider(format!("Intentional failure for {}", month)));
        }
        Ok(self
            .months
            .lock()
            .unwrap()
            .get(&month)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct MockPositionProvider {
    positions: Vec<HeldPosition>,
    fail: bool,
}

#[async_trait]
impl PositionProviderTrait for MockPositionProvider {
    async fn get_positions(&self, _portfolio_id: &str) -> Result<Vec<HeldPosition>> {
        if self.fail {
            return Err(Error::Position("Intentional failure".into()));
        }
        Ok(self.positions.clone())
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn month(y: i32, m: u32) -> CalendarMonth {
    CalendarMonth::new(y, m).unwrap()
}

fn reference() -> NaiveDate {
    date(2024, 3, 15)
}

fn dividend(ticker: &str, pay: &str, amount: f64) -> RawIncomeEvent {
    RawIncomeEvent::new(ticker, "Dividendo")
        .with_detail("paymentDate", json!(pay))
        .with_detail("amountPerUnit", json!(amount))
        .with_detail("source", json!("b3"))
}

fn holdings() -> Vec<HeldPosition> {
    vec![HeldPosition {
        asset_id: "asset-abcd".to_string(),
        ticker: "ABCD".to_string(),
        quantity: dec!(100),
        current_price: Some(dec!(20)),
        average_cost: Some(dec!(10)),
        currency: None,
        status: HoldingStatus::Active,
    }]
}

fn march_provider() -> MockEventProvider {
    MockEventProvider::new()
        .with_month(
            month(2024, 3),
            vec![
                dividend("ABCD", "2024-03-10", 0.5),
                dividend("WXYZ", "2024-03-10", 0.2),
                dividend("EFGH", "2024-03-10", 0.3),
                dividend("IJKL", "2024-03-10", 0.4),
                dividend("ABCD", "2024-03-28", 0.6),
            ],
        )
        .with_month(month(2023, 12), vec![dividend("ABCD", "2023-12-12", 0.4)])
}

fn service_with(
    events: Arc<MockEventProvider>,
    positions: MockPositionProvider,
) -> IncomeCalendarService {
    IncomeCalendarService::new(events, Arc::new(positions), IncomeCalendarConfig::default())
}

fn default_service(events: Arc<MockEventProvider>) -> IncomeCalendarService {
    service_with(
        events,
        MockPositionProvider {
            positions: holdings(),
            fail: false,
        },
    )
}

// =========================================================================
// Selection and loading
// =========================================================================

#[tokio::test]
async fn test_show_month_requires_selection() {
    let service = default_service(Arc::new(MockEventProvider::new()));
    let result = service.show_month(month(2024, 3)).await;
    assert!(matches!(result, Err(Error::NoActiveSelection)));
}

#[tokio::test]
async fn test_blank_portfolio_is_rejected() {
    let service = default_service(Arc::new(MockEventProvider::new()));
    let result = service.select_portfolio("   ", reference());
    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::MissingField(_)))
    ));
}

#[tokio::test]
async fn test_show_month_loads_window_and_builds_view() {
    let provider = Arc::new(march_provider());
    let service = default_service(provider.clone());
    service.select_portfolio("p1", reference()).unwrap();

    let view = service.show_month(month(2024, 3)).await.unwrap().unwrap();

    // Trailing window plus forward horizon, March included.
    assert_eq!(provider.call_count(), 24);
    assert_eq!(service.cached_months(), 24);

    assert_eq!(view.portfolio_id, "p1");
    assert_eq!(view.month, month(2024, 3));
    assert_eq!(view.events.len(), 6);
    assert_eq!(view.scope.len(), 5);

    let crowded = view.grid.cell_for(date(2024, 3, 10)).unwrap();
    assert_eq!(crowded.total_events, 4);
    assert_eq!(crowded.events.len(), 3);
    assert_eq!(crowded.hidden_events, 1);

    let abcd = &view.insights["ABCD"];
    assert_eq!(abcd.paid_count_12m, 2);
    assert_eq!(abcd.per_unit_12m, dec!(0.9));
    assert_eq!(abcd.next_payment_date, Some(date(2024, 3, 28)));
    assert_eq!(abcd.yield_on_cost_12m_pct, Some(dec!(9)));
}

#[tokio::test]
async fn test_month_outside_horizon_is_fetched_too() {
    let provider = Arc::new(
        march_provider().with_month(month(2025, 6), vec![dividend("ABCD", "2025-06-15", 0.7)]),
    );
    let service = default_service(provider.clone());
    service.select_portfolio("p1", reference()).unwrap();

    let view = service.show_month(month(2025, 6)).await.unwrap().unwrap();

    assert_eq!(provider.call_count(), 25);
    assert_eq!(view.scope.len(), 1);
    assert_eq!(view.scope[0].status, IncomeStatus::Provisioned);
    // Insights still cover the months around the reference date.
    assert_eq!(view.insights["ABCD"].paid_count_12m, 2);
    assert_eq!(view.insights["ABCD"].next_payment_date, Some(date(2024, 3, 28)));
}

#[tokio::test]
async fn test_insights_do_not_depend_on_displayed_month() {
    let provider = Arc::new(
        MockEventProvider::new()
            .with_month(month(2024, 3), vec![dividend("ABCD", "2024-03-10", 0.5)])
            .with_month(month(2024, 4), vec![dividend("ABCD", "2024-04-10", 0.5)])
            .with_month(month(2025, 6), vec![dividend("ABCD", "2025-06-10", 0.7)]),
    );
    let service = default_service(provider);
    service.select_portfolio("p1", reference()).unwrap();

    let march = service.show_month(month(2024, 3)).await.unwrap().unwrap();
    let april = service.show_month(month(2024, 4)).await.unwrap().unwrap();
    let far = service.show_month(month(2025, 6)).await.unwrap().unwrap();

    assert_eq!(march.insights["ABCD"].next_payment_date, Some(date(2024, 4, 10)));
    assert_eq!(march.insights["ABCD"].paid_count_12m, 1);
    assert_eq!(april.insights, march.insights);
    assert_eq!(far.insights, march.insights);
    assert_eq!(far.scope.len(), 1);
}

#[tokio::test]
async fn test_revisiting_months_hits_the_cache() {
    let provider = Arc::new(march_provider());
    let service = default_service(provider.clone());
    service.select_portfolio("p1", reference()).unwrap();

    service.show_month(month(2024, 3)).await.unwrap();
    service.show_month(month(2024, 2)).await.unwrap();
    service.show_month(month(2024, 3)).await.unwrap();

    assert_eq!(provider.call_count(), 24);
    assert_eq!(provider.calls_for(month(2024, 3)), 1);
}

#[tokio::test]
async fn test_failed_month_is_empty_and_not_cached() {
    let provider = Arc::new(march_provider());
    provider.set_failing(month(2023, 12), true);
    let service = default_service(provider.clone());
    service.select_portfolio("p1", reference()).unwrap();

    let view = service.show_month(month(2024, 3)).await.unwrap().unwrap();
    assert_eq!(view.events.len(), 5);
    assert_eq!(view.insights["ABCD"].paid_count_12m, 1);
    assert_eq!(service.cached_months(), 23);

    provider.set_failing(month(2023, 12), false);
    let view = service.show_month(month(2024, 3)).await.unwrap().unwrap();
    assert_eq!(view.events.len(), 6);
    assert_eq!(provider.calls_for(month(2023, 12)), 2);
    assert_eq!(provider.calls_for(month(2024, 3)), 1);
}

#[tokio::test]
async fn test_position_failure_degrades_to_missing_quantities() {
    let provider = Arc::new(march_provider());
    let service = service_with(
        provider,
        MockPositionProvider {
            positions: Vec::new(),
            fail: true,
        },
    );
    service.select_portfolio("p1", reference()).unwrap();

    let view = service.show_month(month(2024, 3)).await.unwrap().unwrap();
    let abcd = view.scope.iter().find(|e| e.ticker == "ABCD").unwrap();
    assert_eq!(abcd.quantity, None);
    assert_eq!(abcd.yield_current_pct, None);
    assert_eq!(view.insights["ABCD"].yield_current_12m_pct, None);
}

// =========================================================================
// Invalidation
// =========================================================================

#[tokio::test]
async fn test_portfolio_switch_invalidates_cache_and_snapshot() {
    let provider = Arc::new(march_provider());
    let service = default_service(provider.clone());
    service.select_portfolio("p1", reference()).unwrap();
    service.show_month(month(2024, 3)).await.unwrap();
    assert_eq!(service.cached_months(), 24);

    // Re-selecting the same pair keeps everything.
    service.select_portfolio("p1", reference()).unwrap();
    assert_eq!(service.cached_months(), 24);
    assert!(service.current_view().unwrap().is_some());

    service.select_portfolio("p2", reference()).unwrap();
    assert_eq!(service.cached_months(), 0);
    assert!(service.current_view().unwrap().is_none());

    service.show_month(month(2024, 3)).await.unwrap();
    assert_eq!(provider.call_count(), 48);
    assert!(provider
        .calls
        .lock()
        .unwrap()
        .iter()
        .skip(24)
        .all(|(portfolio, _)| portfolio == "p2"));
}

#[tokio::test]
async fn test_reference_date_change_invalidates_cache() {
    let provider = Arc::new(march_provider());
    let service = default_service(provider.clone());
    service.select_portfolio("p1", reference()).unwrap();
    service.show_month(month(2024, 3)).await.unwrap();

    service.select_portfolio("p1", date(2024, 3, 29)).unwrap();
    assert_eq!(service.cached_months(), 0);

    let view = service.show_month(month(2024, 3)).await.unwrap().unwrap();
    assert_eq!(view.reference_date, date(2024, 3, 29));
    let late = view
        .scope
        .iter()
        .find(|e| e.event_date == date(2024, 3, 28))
        .unwrap();
    assert_eq!(late.status, IncomeStatus::Paid);
    assert_eq!(provider.calls_for(month(2024, 3)), 2);
}

#[tokio::test]
async fn test_stale_response_is_discarded() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Semaphore::new(0));
    let provider = Arc::new(
        MockEventProvider::gated(started.clone(), release.clone())
            .with_month(month(2024, 3), vec![dividend("ABCD", "2024-03-10", 0.5)]),
    );
    let service = Arc::new(default_service(provider));
    service.select_portfolio("p1", reference()).unwrap();

    let in_flight = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.show_month(month(2024, 3)).await })
    };

    started.notified().await;
    service.select_portfolio("p2", reference()).unwrap();
    release.add_permits(64);

    let result = in_flight.await.unwrap().unwrap();
    assert!(result.is_none());
    assert!(service.current_view().unwrap().is_none());
    // Nothing fetched for the old selection is written back.
    assert_eq!(service.cached_months(), 0);
}

#[tokio::test]
async fn test_navigating_away_discards_previous_month() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Semaphore::new(0));
    let provider = Arc::new(
        MockEventProvider::gated(started.clone(), release.clone())
            .with_month(month(2024, 3), vec![dividend("ABCD", "2024-03-10", 0.5)]),
    );
    let service = Arc::new(default_service(provider));
    service.select_portfolio("p1", reference()).unwrap();

    let march = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.show_month(month(2024, 3)).await })
    };
    started.notified().await;

    let february = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.show_month(month(2024, 2)).await })
    };
    release.add_permits(64);

    let february = february.await.unwrap().unwrap();
    let march = march.await.unwrap().unwrap();

    // March may only have committed before February became active.
    assert_eq!(february.map(|v| v.month), Some(month(2024, 2)));
    if let Some(view) = march {
        assert_eq!(view.month, month(2024, 3));
    }
    let view = service.current_view().unwrap().unwrap();
    assert_eq!(view.month, month(2024, 2));
}

#[tokio::test]
async fn test_views_are_withheld_while_another_month_loads() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Semaphore::new(0));
    let provider = Arc::new(
        MockEventProvider::gated(started.clone(), release.clone())
            .with_month(month(2024, 3), vec![dividend("ABCD", "2024-03-10", 0.5)])
            .with_month(month(2025, 6), vec![dividend("ABCD", "2025-06-10", 0.7)]),
    );
    let service = Arc::new(default_service(provider.clone()));
    service.select_portfolio("p1", reference()).unwrap();

    release.add_permits(24);
    let march = service.show_month(month(2024, 3)).await.unwrap().unwrap();
    assert_eq!(march.month, month(2024, 3));
    // Consume the wake-up left behind by the March fetches.
    started.notified().await;

    let far = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.show_month(month(2025, 6)).await })
    };
    started.notified().await;

    // March is still committed but no longer the displayed month.
    assert!(service.current_view().unwrap().is_none());
    assert!(service.select_date(date(2025, 6, 10)).unwrap().is_none());
    assert!(service.toggle_event(&march.scope[0].id).unwrap().is_none());

    release.add_permits(1);
    let view = far.await.unwrap().unwrap().unwrap();
    assert_eq!(view.month, month(2025, 6));
    assert_eq!(view.selection.date, Some(date(2025, 6, 10)));
    assert_eq!(view.selection.event_id, None);
    assert_eq!(view.scope.len(), 1);
    assert_eq!(provider.call_count(), 25);
    assert_eq!(
        service.current_view().unwrap().map(|v| v.month),
        Some(month(2025, 6))
    );
}

// =========================================================================
// View state
// =========================================================================

#[tokio::test]
async fn test_view_updates_without_snapshot_return_none() {
    let service = default_service(Arc::new(MockEventProvider::new()));
    assert!(service.current_view().unwrap().is_none());
    assert!(service
        .set_status_filter(StatusFilter::default())
        .unwrap()
        .is_none());
    assert!(service.select_date(date(2024, 3, 10)).unwrap().is_none());
}

#[tokio::test]
async fn test_status_filter_and_expansion() {
    let service = default_service(Arc::new(march_provider()));
    service.select_portfolio("p1", reference()).unwrap();
    service.show_month(month(2024, 3)).await.unwrap();

    let view = service
        .set_status_filter(StatusFilter {
            paid: false,
            provisioned: true,
        })
        .unwrap()
        .unwrap();
    assert_eq!(view.scope.len(), 1);
    assert_eq!(view.scope[0].event_date, date(2024, 3, 28));
    assert!(view.grid.cell_for(date(2024, 3, 10)).unwrap().events.is_empty());

    service.set_status_filter(StatusFilter::default()).unwrap();
    let view = service.toggle_expanded_date(date(2024, 3, 10)).unwrap().unwrap();
    let cell = view.grid.cell_for(date(2024, 3, 10)).unwrap();
    assert!(cell.is_expanded);
    assert_eq!(cell.events.len(), 4);
    assert_eq!(cell.hidden_events, 0);

    let view = service.toggle_expanded_date(date(2024, 3, 10)).unwrap().unwrap();
    assert_eq!(view.grid.cell_for(date(2024, 3, 10)).unwrap().events.len(), 3);
}

#[tokio::test]
async fn test_selection_flow() {
    let service = default_service(Arc::new(march_provider()));
    service.select_portfolio("p1", reference()).unwrap();
    service.show_month(month(2024, 3)).await.unwrap();

    let view = service.select_date(date(2024, 3, 10)).unwrap().unwrap();
    assert_eq!(view.scope.len(), 4);

    let event_id = view.scope[0].id.clone();
    let view = service.toggle_event(&event_id).unwrap().unwrap();
    assert_eq!(view.scope.len(), 1);
    assert_eq!(view.scope[0].id, event_id);

    // Toggling the same event goes back to the day.
    let view = service.toggle_event(&event_id).unwrap().unwrap();
    assert_eq!(view.scope.len(), 4);
    assert_eq!(view.selection.date, Some(date(2024, 3, 10)));

    // Unknown ids leave the selection alone.
    let view = service.toggle_event("missing").unwrap().unwrap();
    assert_eq!(view.scope.len(), 4);

    let view = service.clear_selection().unwrap().unwrap();
    assert!(view.selection.is_empty());
    assert_eq!(view.scope.len(), 5);
}

#[tokio::test]
async fn test_month_change_resets_selection_but_keeps_filter() {
    let service = default_service(Arc::new(march_provider()));
    service.select_portfolio("p1", reference()).unwrap();
    service.show_month(month(2024, 3)).await.unwrap();

    service.select_date(date(2024, 3, 10)).unwrap();
    service.toggle_expanded_date(date(2024, 3, 10)).unwrap();
    service
        .set_status_filter(StatusFilter {
            paid: true,
            provisioned: false,
        })
        .unwrap();

    let view = service.show_month(month(2023, 12)).await.unwrap().unwrap();
    assert!(view.selection.is_empty());
    assert!(view.expanded_dates.is_empty());
    assert!(!view.status_filter.provisioned);
    assert_eq!(view.scope.len(), 1);
}
