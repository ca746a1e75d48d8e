//! Raw provider records and the logical-field alias table.
//!
//! Providers disagree on field names. Every value the normalizer needs is
//! addressed through a [`RawField`], which carries the ordered list of
//! provider names it may appear under. The first alias holding a usable value
//! wins.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::{normalize_date, parse_amount};

/// Logical fields of a provider details payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawField {
    PaymentDate,
    ExDate,
    RecordDate,
    AnnouncementDate,
    AmountPerUnit,
    TotalAmount,
    NetAmount,
    Currency,
    RawType,
    Source,
    ValueSource,
    SourceUrl,
    Revised,
}

impl RawField {
    /// Provider field names in lookup order.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            RawField::PaymentDate => &[
                "paymentDate",
                "payment_date",
                "payDate",
                "pay_date",
                "dataPagamento",
                "data_pagamento",
                "date",
            ],
            RawField::ExDate => &[
                "exDate",
                "ex_date",
                "exDividendDate",
                "dataCom",
                "data_com",
                "lastDatePrior",
            ],
            RawField::RecordDate => &["recordDate", "record_date", "dataBase", "data_base"],
            RawField::AnnouncementDate => &[
                "announcementDate",
                "announcement_date",
                "declaredDate",
                "declarationDate",
                "approvedOn",
                "dataAprovacao",
                "data_aprovacao",
            ],
            RawField::AmountPerUnit => &[
                "amountPerUnit",
                "amount_per_unit",
                "valuePerShare",
                "value_per_share",
                "rate",
                "valor",
                "value",
            ],
            RawField::TotalAmount => &[
                "totalAmount",
                "total_amount",
                "grossAmount",
                "gross_amount",
                "amount",
                "total",
            ],
            RawField::NetAmount => &["netAmount", "net_amount", "valorLiquido", "valor_liquido"],
            RawField::Currency => &["currency", "moeda"],
            RawField::RawType => &["rawType", "raw_type", "type", "tipo", "label"],
            RawField::Source => &["source", "provider", "fonte"],
            RawField::ValueSource => &["valueSource", "value_source"],
            RawField::SourceUrl => &["sourceUrl", "source_url", "url", "link"],
            RawField::Revised => &["revised", "isRevised", "is_revised", "revision"],
        }
    }
}

/// Provider-specific details payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEventDetails(Map<String, Value>);

impl RawEventDetails {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sets a provider field. Meant for adapters and tests building payloads.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    fn values(&self, field: RawField) -> impl Iterator<Item = &Value> + '_ {
        field
            .aliases()
            .iter()
            .filter_map(move |alias| self.0.get(*alias))
            .filter(|value| !value.is_null())
    }

    pub fn date(&self, field: RawField) -> Option<NaiveDate> {
        self.values(field).find_map(normalize_date)
    }

    pub fn amount(&self, field: RawField) -> Option<Decimal> {
        self.values(field).find_map(parse_amount)
    }

    /// First non-empty string, trimmed.
    pub fn text(&self, field: RawField) -> Option<String> {
        self.values(field).find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
    }

    /// Booleans, `1`/`0` and `"true"`/`"false"`; absent means `false`.
    pub fn flag(&self, field: RawField) -> bool {
        self.values(field)
            .find_map(|value| match value {
                Value::Bool(b) => Some(*b),
                Value::Number(n) => n.as_i64().map(|v| v != 0),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" | "sim" => Some(true),
                    "false" | "0" | "no" | "nao" | "não" => Some(false),
                    _ => None,
                },
                _ => None,
            })
            .unwrap_or(false)
    }
}

/// One record as delivered by an income-event provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIncomeEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    /// Event-type label, e.g. "Dividendo" or "JCP".
    #[serde(default, alias = "type", alias = "eventTypeLabel")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub asset_id: Option<String>,
    /// Top-level payment date, consulted after the details payload.
    #[serde(default, alias = "date")]
    pub payment_date: Option<Value>,
    #[serde(default)]
    pub details: RawEventDetails,
}

impl RawIncomeEvent {
    pub fn new(ticker: &str, event_type: &str) -> Self {
        Self {
            ticker: Some(ticker.to_string()),
            event_type: Some(event_type.to_string()),
            ..Default::default()
        }
    }

    /// Builder-style helper to set a details field.
    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        self.details.insert(key, value);
        self
    }

    /// Uppercased, trimmed ticker; `None` when blank.
    pub fn normalized_ticker(&self) -> Option<String> {
        self.ticker
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_uppercase)
    }

    pub fn resolve_payment_date(&self) -> Option<NaiveDate> {
        self.details
            .date(RawField::PaymentDate)
            .or_else(|| self.payment_date.as_ref().and_then(normalize_date))
    }
}
