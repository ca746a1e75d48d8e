//! Adapter for the market-data fetcher's dividend series.
//!
//! The fetcher answers with an envelope:
//!
//! ```json
//! {"ok": true, "source": "yfinance", "payload": {"ticker": "ABCD3.SA",
//!   "dividends": [{"date": "2024-02-15T00:00:00-03:00", "value": 0.42}]}}
//! ```
//!
//! Non-finite numbers arrive as `null`. Failed fetches carry `ok: false` and
//! an `error` message instead of a payload.

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::income::RawIncomeEvent;
use crate::utils::{parse_amount, positive};

const DEFAULT_SERIES_SOURCE: &str = "yfinance";
const SERIES_EVENT_LABEL: &str = "Dividendo";

#[derive(Debug, Clone, Deserialize)]
pub struct FetchEnvelope {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub payload: Option<DividendSeriesPayload>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DividendSeriesPayload {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub dividends: Option<Vec<DividendPoint>>,
    #[serde(default)]
    pub info: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DividendPoint {
    #[serde(default)]
    pub date: Value,
    #[serde(default)]
    pub value: Value,
}

/// Raw dividend records carried by a fetch envelope.
///
/// Each series point becomes a `Dividendo` record with the point's date as
/// payment date and its value as per-unit amount. Points with a null, zero or
/// negative value are skipped, and an envelope that failed, lacks a ticker or
/// does not parse yields nothing.
pub fn records_from_fetch_envelope(envelope: &Value) -> Vec<RawIncomeEvent> {
    match serde_json::from_value::<FetchEnvelope>(envelope.clone()) {
        Ok(parsed) => records_from_envelope(&parsed),
        Err(e) => {
            warn!("Ignoring malformed dividend fetch envelope: {}", e);
            Vec::new()
        }
    }
}

pub fn records_from_envelope(envelope: &FetchEnvelope) -> Vec<RawIncomeEvent> {
    if !envelope.ok {
        debug!(
            "Skipping failed dividend fetch: {}",
            envelope.error.as_deref().unwrap_or("no error message")
        );
        return Vec::new();
    }
    let Some(payload) = envelope.payload.as_ref() else {
        return Vec::new();
    };
    let Some(ticker) = payload
        .ticker
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return Vec::new();
    };

    let source = envelope
        .source
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_SERIES_SOURCE);
    let currency = payload
        .info
        .as_ref()
        .and_then(|info| info.get("currency"))
        .and_then(Value::as_str)
        .map(str::to_string);

    payload
        .dividends
        .iter()
        .flatten()
        .filter_map(|point| {
            let amount = positive(parse_amount(&point.value))?;
            let mut record = RawIncomeEvent::new(ticker, SERIES_EVENT_LABEL)
                .with_detail("paymentDate", point.date.clone())
                .with_detail("amountPerUnit", Value::String(amount.to_string()))
                .with_detail("source", Value::String(source.to_string()));
            if let Some(currency) = currency.as_ref() {
                record = record.with_detail("currency", Value::String(currency.clone()));
            }
            Some(record)
        })
        .collect()
}
