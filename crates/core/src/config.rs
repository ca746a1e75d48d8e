//! Runtime configuration for the income calendar.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BASE_CURRENCY, DEFAULT_CELL_PREVIEW_LIMIT};

pub const ENV_BASE_CURRENCY: &str = "INCOME_CALENDAR_BASE_CURRENCY";
pub const ENV_CELL_PREVIEW_LIMIT: &str = "INCOME_CALENDAR_CELL_PREVIEW_LIMIT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeCalendarConfig {
    /// Currency assigned to events whose record and holding carry none.
    pub base_currency: String,
    /// Events shown per calendar cell unless the date is expanded.
    pub cell_preview_limit: usize,
}

impl Default for IncomeCalendarConfig {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            cell_preview_limit: DEFAULT_CELL_PREVIEW_LIMIT,
        }
    }
}

impl IncomeCalendarConfig {
    /// Reads overrides from the environment. Missing or unparseable values
    /// keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            base_currency: lookup(ENV_BASE_CURRENCY)
                .map(|v| v.trim().to_uppercase())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.base_currency),
            cell_preview_limit: lookup(ENV_CELL_PREVIEW_LIMIT)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.cell_preview_limit),
        }
    }
}
