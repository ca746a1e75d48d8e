//! Per-(portfolio, month) cache of raw provider records.

use dashmap::DashMap;
use log::debug;
use std::sync::Arc;

use crate::calendar::CalendarMonth;
use crate::income::RawIncomeEvent;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonthKey {
    pub portfolio_id: String,
    pub month: CalendarMonth,
}

impl MonthKey {
    pub fn new(portfolio_id: &str, month: CalendarMonth) -> Self {
        Self {
            portfolio_id: portfolio_id.to_string(),
            month,
        }
    }
}

/// Fetched months keyed by portfolio and month.
///
/// Entries are independent, so concurrent fetches of different months never
/// contend on the same slot. Only successful fetches are inserted.
#[derive(Debug, Default)]
pub struct MonthEventCache {
    entries: DashMap<MonthKey, Arc<Vec<RawIncomeEvent>>>,
}

impl MonthEventCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &MonthKey) -> Option<Arc<Vec<RawIncomeEvent>>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn insert(&self, key: MonthKey, records: Vec<RawIncomeEvent>) -> Arc<Vec<RawIncomeEvent>> {
        let records = Arc::new(records);
        self.entries.insert(key, Arc::clone(&records));
        records
    }

    pub fn contains(&self, key: &MonthKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Drops every entry.
    pub fn invalidate_all(&self) {
        let count = self.entries.len();
        self.entries.clear();
        if count > 0 {
            debug!("Invalidated {} cached income months", count);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
