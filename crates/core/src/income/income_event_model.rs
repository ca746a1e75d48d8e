use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed taxonomy of income events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeCategory {
    Dividend,
    /// Interest on equity, taxed at source.
    Jcp,
    Amortization,
    /// Fund distribution.
    Rendimento,
    Subscription,
    Other,
}

impl IncomeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeCategory::Dividend => "dividend",
            IncomeCategory::Jcp => "jcp",
            IncomeCategory::Amortization => "amortization",
            IncomeCategory::Rendimento => "rendimento",
            IncomeCategory::Subscription => "subscription",
            IncomeCategory::Other => "other",
        }
    }

    /// Categories that pay cash per held unit.
    pub fn is_income_bearing(&self) -> bool {
        matches!(
            self,
            IncomeCategory::Dividend
                | IncomeCategory::Jcp
                | IncomeCategory::Rendimento
                | IncomeCategory::Amortization
        )
    }

    /// Dedup family. Dividend, rendimento and other collapse into `Income`;
    /// jcp, amortization and subscription stay apart.
    pub fn family(&self) -> EventFamily {
        match self {
            IncomeCategory::Jcp => EventFamily::Jcp,
            IncomeCategory::Amortization => EventFamily::Amortization,
            IncomeCategory::Subscription => EventFamily::Subscription,
            IncomeCategory::Dividend | IncomeCategory::Rendimento | IncomeCategory::Other => {
                EventFamily::Income
            }
        }
    }
}

impl fmt::Display for IncomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFamily {
    Jcp,
    Amortization,
    Subscription,
    Income,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeStatus {
    Paid,
    Provisioned,
}

impl IncomeStatus {
    /// Paid when the payment date is strictly before the reference date.
    pub fn for_event_date(event_date: NaiveDate, reference_date: NaiveDate) -> Self {
        if event_date < reference_date {
            IncomeStatus::Paid
        } else {
            IncomeStatus::Provisioned
        }
    }
}

/// Why a dedup group was flagged as revised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevisionNote {
    /// Candidates reported different per-unit amounts.
    ValueConflict,
    /// A candidate's value came from a different source than the record itself.
    SourceOverride,
    /// The provider marked the record as revised.
    ProviderFlagged,
}

impl RevisionNote {
    pub fn as_key(&self) -> &'static str {
        match self {
            RevisionNote::ValueConflict => "valueConflict",
            RevisionNote::SourceOverride => "sourceOverride",
            RevisionNote::ProviderFlagged => "providerFlagged",
        }
    }
}

/// Canonical income event, built by the normalizer and annotated by the
/// deduplicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeEvent {
    pub id: String,
    pub ticker: String,
    pub asset_id: Option<String>,
    pub category: IncomeCategory,
    /// Free-text label as reported by the provider.
    pub event_type: Option<String>,

    // Dates
    pub event_date: NaiveDate,
    pub ex_date: Option<NaiveDate>,
    pub record_date: Option<NaiveDate>,
    pub announcement_date: Option<NaiveDate>,

    // Amounts
    pub amount_per_unit: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub expected_gross: Option<Decimal>,
    pub expected_net: Option<Decimal>,
    pub net_is_estimated: bool,
    pub currency: String,

    pub status: IncomeStatus,

    // Provenance
    pub source: Option<String>,
    pub value_source: Option<String>,
    pub source_url: Option<String>,
    pub provider_revised: bool,

    // Set by the deduplicator
    pub has_revision: bool,
    pub revision_note_key: Option<RevisionNote>,

    // Yields (percent)
    pub yield_current_pct: Option<Decimal>,
    pub yield_on_cost_pct: Option<Decimal>,
}

impl IncomeEvent {
    pub fn is_paid(&self) -> bool {
        self.status == IncomeStatus::Paid
    }

    pub fn is_provisioned(&self) -> bool {
        self.status == IncomeStatus::Provisioned
    }

    pub fn family(&self) -> EventFamily {
        self.category.family()
    }
}
