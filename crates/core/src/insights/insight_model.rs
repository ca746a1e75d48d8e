use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment cadence inferred from the gaps between paid dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentFrequency {
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
    Irregular,
    /// Fewer than three distinct paid dates.
    InsufficientData,
}

/// Trailing 12-month statistics for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerInsight {
    pub ticker: String,
    pub asset_id: Option<String>,
    pub currency: Option<String>,

    pub window_start: NaiveDate,
    pub window_end: NaiveDate,

    // Paid income-bearing events inside the window
    pub total_gross_12m: Decimal,
    pub total_net_12m: Decimal,
    pub per_unit_12m: Decimal,
    pub paid_count_12m: usize,
    pub paid_dates: Vec<NaiveDate>,

    pub frequency: PaymentFrequency,
    pub average_gap_days: Option<Decimal>,

    // Across all events of the ticker
    pub next_payment_date: Option<NaiveDate>,
    pub last_announcement_date: Option<NaiveDate>,
    pub has_revision: bool,

    pub current_price: Option<Decimal>,
    pub average_cost: Option<Decimal>,
    pub yield_current_12m_pct: Option<Decimal>,
    pub yield_on_cost_12m_pct: Option<Decimal>,
}
