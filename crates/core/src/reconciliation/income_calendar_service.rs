use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{
    build_view, reconcile_snapshot, IncomeCalendarView, ReconciledSnapshot, ViewKey, ViewState,
};
use crate::calendar::{CalendarMonth, StatusFilter};
use crate::config::IncomeCalendarConfig;
use crate::errors::{Error, Result, ValidationError};
use crate::income::{PositionLookup, RawIncomeEvent};
use crate::insights::insight_months;
use crate::provider::{IncomeEventProviderTrait, MonthEventCache, MonthKey, PositionProviderTrait};

/// Trait defining the contract for the income calendar service.
#[async_trait]
pub trait IncomeCalendarServiceTrait: Send + Sync {
    /// Activates a portfolio and reference date. Changing either drops every
    /// cached month and the committed snapshot.
    fn select_portfolio(&self, portfolio_id: &str, reference_date: NaiveDate) -> Result<()>;

    /// Loads and reconciles `month`. Returns `None` when the selection moved
    /// on while the fetch was in flight.
    async fn show_month(&self, month: CalendarMonth) -> Result<Option<IncomeCalendarView>>;

    fn set_status_filter(&self, filter: StatusFilter) -> Result<Option<IncomeCalendarView>>;
    fn toggle_expanded_date(&self, date: NaiveDate) -> Result<Option<IncomeCalendarView>>;
    fn select_date(&self, date: NaiveDate) -> Result<Option<IncomeCalendarView>>;
    fn toggle_event(&self, event_id: &str) -> Result<Option<IncomeCalendarView>>;
    fn clear_selection(&self) -> Result<Option<IncomeCalendarView>>;

    /// View derived from the committed snapshot, if it matches the active
    /// portfolio, month and reference date.
    fn current_view(&self) -> Result<Option<IncomeCalendarView>>;
}

#[derive(Debug, Default)]
struct ServiceState {
    portfolio_id: Option<String>,
    reference_date: Option<NaiveDate>,
    month: Option<CalendarMonth>,
    view_state: ViewState,
    snapshot: Option<Arc<ReconciledSnapshot>>,
}

impl ServiceState {
    fn active_key(&self) -> Option<ViewKey> {
        Some(ViewKey {
            portfolio_id: self.portfolio_id.clone()?,
            month: self.month?,
            reference_date: self.reference_date?,
        })
    }
}

pub struct IncomeCalendarService {
    event_provider: Arc<dyn IncomeEventProviderTrait>,
    position_provider: Arc<dyn PositionProviderTrait>,
    config: IncomeCalendarConfig,
    cache: MonthEventCache,
    // Bumped on every invalidation; fetches started under an older value are
    // not written back.
    cache_generation: AtomicU64,
    state: RwLock<ServiceState>,
}

impl IncomeCalendarService {
    pub fn new(
        event_provider: Arc<dyn IncomeEventProviderTrait>,
        position_provider: Arc<dyn PositionProviderTrait>,
        config: IncomeCalendarConfig,
    ) -> Self {
        Self {
            event_provider,
            position_provider,
            config,
            cache: MonthEventCache::new(),
            cache_generation: AtomicU64::new(0),
            state: RwLock::new(ServiceState::default()),
        }
    }

    pub fn config(&self) -> &IncomeCalendarConfig {
        &self.config
    }

    /// Number of months currently cached.
    pub fn cached_months(&self) -> usize {
        self.cache.len()
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, ServiceState>> {
        self.state
            .read()
            .map_err(|e| Error::Unexpected(format!("Income calendar state poisoned: {}", e)))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, ServiceState>> {
        self.state
            .write()
            .map_err(|e| Error::Unexpected(format!("Income calendar state poisoned: {}", e)))
    }

    /// Months a view of `month` depends on: the insight months around the
    /// reference month, plus the displayed month when it lies outside them.
    fn months_to_load(month: CalendarMonth, reference_date: NaiveDate) -> Vec<CalendarMonth> {
        let mut months = insight_months(reference_date);
        if !months.contains(&month) {
            months.push(month);
        }
        months
    }

    async fn load_month(&self, portfolio_id: &str, month: CalendarMonth) -> Arc<Vec<RawIncomeEvent>> {
        let key = MonthKey::new(portfolio_id, month);
        if let Some(records) = self.cache.get(&key) {
            return records;
        }

        let generation = self.cache_generation.load(Ordering::SeqCst);
        match self.event_provider.fetch_month(portfolio_id, month).await {
            Ok(records) => {
                debug!("Fetched {} income records for {}", records.len(), month);
                if self.cache_generation.load(Ordering::SeqCst) == generation {
                    self.cache.insert(key, records)
                } else {
                    Arc::new(records)
                }
            }
            Err(e) => {
                error!(
                    "Failed to fetch income events for portfolio {} month {}: {}",
                    portfolio_id, month, e
                );
                Arc::new(Vec::new())
            }
        }
    }

    async fn load_positions(&self, portfolio_id: &str) -> PositionLookup {
        match self.position_provider.get_positions(portfolio_id).await {
            Ok(positions) => PositionLookup::new(positions),
            Err(e) => {
                warn!(
                    "Failed to load positions for portfolio {}: {}",
                    portfolio_id, e
                );
                PositionLookup::empty()
            }
        }
    }

    /// View of the committed snapshot, provided it belongs to the active
    /// selection. While another month is loading there is none.
    fn committed_view(&self, state: &ServiceState) -> Option<IncomeCalendarView> {
        let snapshot = state.snapshot.as_ref()?;
        if state.active_key().as_ref() != Some(&snapshot.key) {
            return None;
        }
        Some(build_view(
            snapshot,
            &state.view_state,
            self.config.cell_preview_limit,
        ))
    }

    /// Applies `update` to the view state and re-derives the view.
    fn update_view<F>(&self, update: F) -> Result<Option<IncomeCalendarView>>
    where
        F: FnOnce(&mut ServiceState),
    {
        let mut state = self.write_state()?;
        update(&mut *state);
        Ok(self.committed_view(&state))
    }
}

#[async_trait]
impl IncomeCalendarServiceTrait for IncomeCalendarService {
    fn select_portfolio(&self, portfolio_id: &str, reference_date: NaiveDate) -> Result<()> {
        let portfolio_id = portfolio_id.trim();
        if portfolio_id.is_empty() {
            return Err(ValidationError::MissingField("portfolioId".to_string()).into());
        }

        let mut state = self.write_state()?;
        let unchanged = state.portfolio_id.as_deref() == Some(portfolio_id)
            && state.reference_date == Some(reference_date);
        if unchanged {
            return Ok(());
        }

        self.cache_generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
        state.portfolio_id = Some(portfolio_id.to_string());
        state.reference_date = Some(reference_date);
        state.month = None;
        state.snapshot = None;
        state.view_state.reset_navigation();

        info!(
            "Selected portfolio {} with reference date {}",
            portfolio_id, reference_date
        );
        Ok(())
    }

    async fn show_month(&self, month: CalendarMonth) -> Result<Option<IncomeCalendarView>> {
        let request = {
            let mut state = self.write_state()?;
            if state.month != Some(month) {
                state.view_state.reset_navigation();
            }
            state.month = Some(month);
            state.active_key().ok_or(Error::NoActiveSelection)?
        };

        let months = Self::months_to_load(month, request.reference_date);
        let (positions, loaded) = futures::join!(
            self.load_positions(&request.portfolio_id),
            join_all(
                months
                    .iter()
                    .map(|m| self.load_month(&request.portfolio_id, *m))
            )
        );

        let raws: Vec<RawIncomeEvent> = loaded
            .iter()
            .flat_map(|records| records.iter().cloned())
            .collect();
        let snapshot = reconcile_snapshot(
            request.clone(),
            &raws,
            &positions,
            &self.config.base_currency,
        );

        let mut state = self.write_state()?;
        if state.active_key().as_ref() != Some(&request) {
            debug!(
                "Discarding stale income calendar response for portfolio {} month {}",
                request.portfolio_id, request.month
            );
            return Ok(None);
        }

        let snapshot = Arc::new(snapshot);
        state.snapshot = Some(Arc::clone(&snapshot));
        Ok(Some(build_view(
            &snapshot,
            &state.view_state,
            self.config.cell_preview_limit,
        )))
    }

    fn set_status_filter(&self, filter: StatusFilter) -> Result<Option<IncomeCalendarView>> {
        self.update_view(|state| state.view_state.status_filter = filter)
    }

    fn toggle_expanded_date(&self, date: NaiveDate) -> Result<Option<IncomeCalendarView>> {
        self.update_view(|state| state.view_state.toggle_expanded(date))
    }

    fn select_date(&self, date: NaiveDate) -> Result<Option<IncomeCalendarView>> {
        self.update_view(|state| state.view_state.selection.select_date(date))
    }

    fn toggle_event(&self, event_id: &str) -> Result<Option<IncomeCalendarView>> {
        self.update_view(|state| {
            let active = state.active_key();
            let event = state
                .snapshot
                .as_ref()
                .filter(|snapshot| active.as_ref() == Some(&snapshot.key))
                .and_then(|snapshot| snapshot.events.iter().find(|e| e.id == event_id))
                .cloned();
            match event {
                Some(event) => state.view_state.selection.toggle_event(&event),
                None => warn!("Ignoring selection of unknown income event {}", event_id),
            }
        })
    }

    fn clear_selection(&self) -> Result<Option<IncomeCalendarView>> {
        self.update_view(|state| state.view_state.selection.clear())
    }

    fn current_view(&self) -> Result<Option<IncomeCalendarView>> {
        let state = self.read_state()?;
        Ok(self.committed_view(&state))
    }
}
