use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Coerces a provider value into a decimal amount.
///
/// Accepts JSON numbers and numeric strings (plain or scientific notation).
/// Null, empty strings, booleans and anything non-finite yield `None`.
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_amount_str(&n.to_string()),
        Value::String(s) => parse_amount_str(s),
        _ => None,
    }
}

pub fn parse_amount_str(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Keeps the value only when it is strictly positive.
pub fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| v.is_sign_positive() && !v.is_zero())
}

/// `numerator / denominator * 100`, or `None` when either side is missing or
/// the denominator is not strictly positive.
pub fn percentage_of(numerator: Option<Decimal>, denominator: Option<Decimal>) -> Option<Decimal> {
    let numerator = numerator?;
    let denominator = positive(denominator)?;
    numerator
        .checked_div(denominator)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
}
