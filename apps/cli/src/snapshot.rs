//! File-backed providers for offline runs.
//!
//! A snapshot file looks like:
//!
//! ```json
//! {
//!   "positions": [{"assetId": "a1", "ticker": "ABCD", "quantity": 100}],
//!   "months": {"2024-02": [{"ticker": "ABCD", "type": "Dividendo", "details": {}}]},
//!   "fetchEnvelopes": [{"ok": true, "source": "yfinance", "payload": {}}]
//! }
//! ```
//!
//! Records from fetch envelopes are bucketed into months by payment date.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;

use income_calendar_core::calendar::CalendarMonth;
use income_calendar_core::income::{HeldPosition, RawIncomeEvent};
use income_calendar_core::provider::{
    records_from_fetch_envelope, IncomeEventProviderTrait, PositionProviderTrait,
};
use income_calendar_core::Result;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFile {
    #[serde(default)]
    pub positions: Vec<HeldPosition>,
    #[serde(default)]
    pub months: BTreeMap<String, Vec<RawIncomeEvent>>,
    #[serde(default)]
    pub fetch_envelopes: Vec<Value>,
}

impl SnapshotFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }
}

/// Serves one snapshot to every portfolio id.
#[derive(Debug, Default)]
pub struct SnapshotProvider {
    positions: Vec<HeldPosition>,
    months: HashMap<CalendarMonth, Vec<RawIncomeEvent>>,
}

impl SnapshotProvider {
    pub fn from_file(file: SnapshotFile) -> anyhow::Result<Self> {
        let mut months: HashMap<CalendarMonth, Vec<RawIncomeEvent>> = HashMap::new();
        for (key, records) in file.months {
            let month = CalendarMonth::from_str(&key)
                .with_context(|| format!("Invalid month key in snapshot: {}", key))?;
            months.entry(month).or_default().extend(records);
        }

        let mut unplaced = 0usize;
        for envelope in &file.fetch_envelopes {
            for record in records_from_fetch_envelope(envelope) {
                match record.resolve_payment_date() {
                    Some(date) => months
                        .entry(CalendarMonth::from_date(date))
                        .or_default()
                        .push(record),
                    None => unplaced += 1,
                }
            }
        }
        if unplaced > 0 {
            tracing::warn!("Skipped {} series records without a payment date", unplaced);
        }

        tracing::debug!(
            "Loaded snapshot with {} positions across {} months",
            file.positions.len(),
            months.len()
        );
        Ok(Self {
            positions: file.positions,
            months,
        })
    }

    pub fn month_count(&self) -> usize {
        self.months.len()
    }
}

#[async_trait]
impl IncomeEventProviderTrait for SnapshotProvider {
    async fn fetch_month(
        &self,
        _portfolio_id: &str,
        month: CalendarMonth,
    ) -> Result<Vec<RawIncomeEvent>> {
        Ok(self.months.get(&month).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl PositionProviderTrait for SnapshotProvider {
    async fn get_positions(&self, _portfolio_id: &str) -> Result<Vec<HeldPosition>> {
        Ok(self.positions.clone())
    }
}
