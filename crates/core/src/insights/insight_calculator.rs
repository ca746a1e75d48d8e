//! Per-ticker trailing 12-month statistics.
//!
//! Insights are recomputed wholesale from the deduplicated events on every
//! pass. The window is month-aligned: it starts on the first day of the month
//! eleven months before the reference month and ends on the last day of the
//! reference month.

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::{PaymentFrequency, TickerInsight};
use crate::calendar::CalendarMonth;
use crate::constants::{
    DISPLAY_DECIMAL_PRECISION, INSIGHT_FORWARD_MONTHS, INSIGHT_WINDOW_MONTHS,
    YIELD_DECIMAL_PRECISION,
};
use crate::income::{IncomeEvent, PositionLookup};
use crate::utils::{days_between, percentage_of};

const MONTHLY_MAX_GAP: i64 = 45;
const QUARTERLY_MAX_GAP: i64 = 110;
const SEMIANNUAL_MAX_GAP: i64 = 200;
const ANNUAL_MAX_GAP: i64 = 400;

/// Inclusive `(start, end)` of the trailing window for `reference_date`.
pub fn insight_window(reference_date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let reference_month = CalendarMonth::from_date(reference_date);
    let start = reference_month
        .shift(-(INSIGHT_WINDOW_MONTHS as i32 - 1))
        .first_day();
    (start, reference_month.last_day())
}

/// Months whose events feed the insights for `reference_date`, oldest first:
/// the trailing window followed by the forward horizon. The set depends on
/// the reference date alone.
pub fn insight_months(reference_date: NaiveDate) -> Vec<CalendarMonth> {
    CalendarMonth::from_date(reference_date)
        .shift(INSIGHT_FORWARD_MONTHS as i32)
        .trailing(INSIGHT_WINDOW_MONTHS + INSIGHT_FORWARD_MONTHS)
}

/// Average gap in days between consecutive distinct dates, with fewer than
/// two distinct dates yielding `None`.
pub fn average_gap_days(dates: &[NaiveDate]) -> Option<Decimal> {
    let mut distinct = dates.to_vec();
    distinct.sort();
    distinct.dedup();

    let (first, last) = (distinct.first()?, distinct.last()?);
    let gaps = distinct.len() as i64 - 1;
    if gaps == 0 {
        return None;
    }
    Some(Decimal::from(days_between(*first, *last)) / Decimal::from(gaps))
}

/// Classifies payment cadence. Each bound is inclusive.
pub fn classify_frequency(dates: &[NaiveDate]) -> PaymentFrequency {
    let mut distinct = dates.to_vec();
    distinct.sort();
    distinct.dedup();
    if distinct.len() < 3 {
        return PaymentFrequency::InsufficientData;
    }

    match average_gap_days(&distinct) {
        Some(gap) if gap <= Decimal::from(MONTHLY_MAX_GAP) => PaymentFrequency::Monthly,
        Some(gap) if gap <= Decimal::from(QUARTERLY_MAX_GAP) => PaymentFrequency::Quarterly,
        Some(gap) if gap <= Decimal::from(SEMIANNUAL_MAX_GAP) => PaymentFrequency::Semiannual,
        Some(gap) if gap <= Decimal::from(ANNUAL_MAX_GAP) => PaymentFrequency::Annual,
        Some(_) => PaymentFrequency::Irregular,
        None => PaymentFrequency::InsufficientData,
    }
}

#[derive(Default)]
struct InsightAccumulator {
    asset_id: Option<String>,
    currency: Option<String>,
    total_gross: Decimal,
    total_net: Decimal,
    per_unit: Decimal,
    paid_count: usize,
    paid_dates: Vec<NaiveDate>,
    next_payment_date: Option<NaiveDate>,
    last_announcement_date: Option<NaiveDate>,
    has_revision: bool,
}

impl InsightAccumulator {
    fn add(&mut self, event: &IncomeEvent, window: (NaiveDate, NaiveDate), reference_date: NaiveDate) {
        if self.asset_id.is_none() {
            self.asset_id = event.asset_id.clone();
        }
        if self.currency.is_none() {
            self.currency = Some(event.currency.clone());
        }
        if let Some(announced) = event.announcement_date {
            self.last_announcement_date = self.last_announcement_date.max(Some(announced));
        }

        if !event.category.is_income_bearing() {
            return;
        }

        // Only events summed into the trailing figures carry their revision flag.
        let in_window = event.event_date >= window.0 && event.event_date <= window.1;
        if event.is_paid() && in_window && self.add_paid(event) {
            self.has_revision |= event.has_revision;
        }

        if event.is_provisioned() && event.event_date >= reference_date {
            self.next_payment_date = Some(match self.next_payment_date {
                Some(current) => current.min(event.event_date),
                None => event.event_date,
            });
        }
    }

    /// Folds a paid in-window event into the trailing sums. An event whose
    /// amounts would overflow a sum is left out entirely.
    fn add_paid(&mut self, event: &IncomeEvent) -> bool {
        let sums = (
            self.total_gross
                .checked_add(event.expected_gross.unwrap_or(Decimal::ZERO)),
            self.total_net
                .checked_add(event.expected_net.unwrap_or(Decimal::ZERO)),
            self.per_unit
                .checked_add(event.amount_per_unit.unwrap_or(Decimal::ZERO)),
        );
        let (Some(gross), Some(net), Some(per_unit)) = sums else {
            warn!(
                "Trailing income sums overflowed for {}, skipping {}",
                event.ticker, event.id
            );
            return false;
        };

        self.total_gross = gross;
        self.total_net = net;
        self.per_unit = per_unit;
        self.paid_count += 1;
        self.paid_dates.push(event.event_date);
        true
    }

    fn finish(
        mut self,
        ticker: String,
        window: (NaiveDate, NaiveDate),
        positions: &PositionLookup,
    ) -> TickerInsight {
        self.paid_dates.sort();

        let position = positions.resolve(self.asset_id.as_deref(), &ticker);
        let current_price = position.and_then(|p| p.current_price);
        let average_cost = position.and_then(|p| p.average_cost);
        let yield_of = |denominator| {
            percentage_of(Some(self.per_unit), denominator)
                .map(|y| y.round_dp(YIELD_DECIMAL_PRECISION))
        };

        TickerInsight {
            asset_id: self
                .asset_id
                .clone()
                .or_else(|| position.map(|p| p.asset_id.clone())),
            currency: self.currency.clone(),
            window_start: window.0,
            window_end: window.1,
            total_gross_12m: self.total_gross,
            total_net_12m: self.total_net,
            per_unit_12m: self.per_unit,
            paid_count_12m: self.paid_count,
            frequency: classify_frequency(&self.paid_dates),
            average_gap_days: average_gap_days(&self.paid_dates)
                .map(|gap| gap.round_dp(DISPLAY_DECIMAL_PRECISION)),
            yield_current_12m_pct: yield_of(current_price),
            yield_on_cost_12m_pct: yield_of(average_cost),
            paid_dates: self.paid_dates,
            next_payment_date: self.next_payment_date,
            last_announcement_date: self.last_announcement_date,
            has_revision: self.has_revision,
            current_price,
            average_cost,
            ticker,
        }
    }
}

/// One insight per distinct ticker, keyed by ticker.
pub fn compute_ticker_insights(
    events: &[IncomeEvent],
    reference_date: NaiveDate,
    positions: &PositionLookup,
) -> BTreeMap<String, TickerInsight> {
    let window = insight_window(reference_date);

    let mut accumulators: BTreeMap<String, InsightAccumulator> = BTreeMap::new();
    for event in events {
        accumulators
            .entry(event.ticker.clone())
            .or_default()
            .add(event, window, reference_date);
    }

    let insights: BTreeMap<String, TickerInsight> = accumulators
        .into_iter()
        .map(|(ticker, acc)| (ticker.clone(), acc.finish(ticker, window, positions)))
        .collect();

    debug!(
        "Computed income insights for {} tickers ({} to {})",
        insights.len(),
        window.0,
        window.1
    );
    insights
}
