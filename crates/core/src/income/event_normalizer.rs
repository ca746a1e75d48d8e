//! Raw provider record -> canonical [`IncomeEvent`].

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::{
    classify_category, HeldPosition, IncomeCategory, IncomeEvent, IncomeStatus, PositionLookup,
    RawField, RawIncomeEvent,
};
use crate::constants::{JCP_NET_FACTOR, YIELD_DECIMAL_PRECISION};
use crate::utils::{percentage_of, positive};

/// Inputs shared by every record of a normalization pass.
#[derive(Debug, Clone, Copy)]
pub struct NormalizationContext<'a> {
    pub reference_date: NaiveDate,
    pub base_currency: &'a str,
    pub positions: &'a PositionLookup,
}

/// Identifier used when the provider supplies none.
pub fn derive_event_id(
    ticker: &str,
    event_date: NaiveDate,
    category: IncomeCategory,
    ordinal: usize,
) -> String {
    format!("{}-{}-{}-{}", ticker, event_date, category.as_str(), ordinal)
}

/// Gross amount: per-unit amount times held quantity when both are positive
/// and the product fits, else the provider's total. Only income-bearing
/// categories have one.
pub fn expected_gross(
    category: IncomeCategory,
    amount_per_unit: Option<Decimal>,
    quantity: Option<Decimal>,
    total_amount: Option<Decimal>,
) -> Option<Decimal> {
    if !category.is_income_bearing() {
        return None;
    }
    match (positive(amount_per_unit), positive(quantity)) {
        (Some(amount), Some(qty)) => amount.checked_mul(qty).or_else(|| {
            warn!(
                "Gross amount overflowed for {} x {}, using provider total",
                amount, qty
            );
            total_amount
        }),
        _ => total_amount,
    }
}

/// Net amount and whether it was estimated.
///
/// An explicit net figure always wins. Without one, jcp keeps 85% of gross
/// and the other income categories pass gross through untouched.
pub fn expected_net(
    category: IncomeCategory,
    gross: Option<Decimal>,
    explicit_net: Option<Decimal>,
) -> (Option<Decimal>, bool) {
    if explicit_net.is_some() {
        return (explicit_net, false);
    }
    match (category, gross) {
        (IncomeCategory::Jcp, Some(gross)) => match gross.checked_mul(JCP_NET_FACTOR) {
            Some(net) => (Some(net), true),
            None => (None, false),
        },
        (c, Some(gross)) if c.is_income_bearing() => (Some(gross), false),
        _ => (None, false),
    }
}

fn yield_pct(amount_per_unit: Option<Decimal>, denominator: Option<Decimal>) -> Option<Decimal> {
    percentage_of(amount_per_unit, denominator).map(|y| y.round_dp(YIELD_DECIMAL_PRECISION))
}

fn resolve_currency(
    event_currency: Option<String>,
    position: Option<&HeldPosition>,
    base_currency: &str,
) -> String {
    event_currency
        .or_else(|| {
            position
                .and_then(|p| p.currency.as_deref())
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| base_currency.to_string())
        .to_uppercase()
}

/// Builds one canonical event, or `None` when the record has no usable ticker
/// or payment date.
///
/// `ordinal` only matters when the record carries no id of its own.
pub fn normalize_event(
    raw: &RawIncomeEvent,
    ordinal: usize,
    ctx: &NormalizationContext<'_>,
) -> Option<IncomeEvent> {
    let ticker = raw.normalized_ticker()?;
    let event_date = raw.resolve_payment_date()?;
    let details = &raw.details;

    let raw_type = details.text(RawField::RawType);
    let category = classify_category(raw.event_type.as_deref(), raw_type.as_deref());

    let asset_id_hint = raw
        .asset_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let position = ctx.positions.resolve(asset_id_hint, &ticker);

    let amount_per_unit = details.amount(RawField::AmountPerUnit);
    let quantity = position.map(|p| p.quantity);
    let gross = expected_gross(
        category,
        amount_per_unit,
        quantity,
        details.amount(RawField::TotalAmount),
    );
    let (net, net_is_estimated) =
        expected_net(category, gross, details.amount(RawField::NetAmount));

    let id = raw
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| derive_event_id(&ticker, event_date, category, ordinal));

    Some(IncomeEvent {
        id,
        asset_id: asset_id_hint
            .map(str::to_string)
            .or_else(|| position.map(|p| p.asset_id.clone())),
        category,
        event_type: raw
            .event_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        event_date,
        ex_date: details.date(RawField::ExDate),
        record_date: details.date(RawField::RecordDate),
        announcement_date: details.date(RawField::AnnouncementDate),
        amount_per_unit,
        quantity,
        expected_gross: gross,
        expected_net: net,
        net_is_estimated,
        currency: resolve_currency(details.text(RawField::Currency), position, ctx.base_currency),
        status: IncomeStatus::for_event_date(event_date, ctx.reference_date),
        source: details.text(RawField::Source),
        value_source: details.text(RawField::ValueSource),
        source_url: details.text(RawField::SourceUrl),
        provider_revised: details.flag(RawField::Revised),
        has_revision: false,
        revision_note_key: None,
        yield_current_pct: yield_pct(amount_per_unit, position.and_then(|p| p.current_price)),
        yield_on_cost_pct: yield_pct(amount_per_unit, position.and_then(|p| p.average_cost)),
        ticker,
    })
}

/// Normalizes a batch, dropping unusable records.
///
/// Derived ids count occurrences of the same ticker, date and category within
/// the batch, so they do not shift when unrelated records come and go.
pub fn normalize_events(raws: &[RawIncomeEvent], ctx: &NormalizationContext<'_>) -> Vec<IncomeEvent> {
    let mut ordinals: HashMap<(String, NaiveDate, IncomeCategory), usize> = HashMap::new();
    let mut events = Vec::with_capacity(raws.len());
    let mut dropped = 0usize;

    for raw in raws {
        let Some(mut event) = normalize_event(raw, 0, ctx) else {
            dropped += 1;
            continue;
        };

        let has_own_id = raw.id.as_deref().is_some_and(|id| !id.trim().is_empty());
        if !has_own_id {
            let slot = ordinals
                .entry((event.ticker.clone(), event.event_date, event.category))
                .or_insert(0);
            event.id = derive_event_id(&event.ticker, event.event_date, event.category, *slot);
            *slot += 1;
        }
        events.push(event);
    }

    if dropped > 0 {
        warn!(
            "Dropped {} of {} income records without a ticker or payment date",
            dropped,
            raws.len()
        );
    }
    debug!("Normalized {} income events", events.len());
    events
}
