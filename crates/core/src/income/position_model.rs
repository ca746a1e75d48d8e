use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldingStatus {
    #[default]
    Active,
    Closed,
}

/// Holding data supplied by the position/pricing collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldPosition {
    pub asset_id: String,
    pub ticker: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub average_cost: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: HoldingStatus,
}

/// Active holdings indexed by asset id and by ticker.
///
/// When several holdings share a key the first one supplied wins.
#[derive(Debug, Clone, Default)]
pub struct PositionLookup {
    positions: Vec<HeldPosition>,
    by_asset_id: HashMap<String, usize>,
    by_ticker: HashMap<String, usize>,
}

impl PositionLookup {
    pub fn new(positions: Vec<HeldPosition>) -> Self {
        let positions: Vec<HeldPosition> = positions
            .into_iter()
            .filter(|p| p.status == HoldingStatus::Active)
            .collect();

        let mut by_asset_id = HashMap::new();
        let mut by_ticker = HashMap::new();
        for (idx, position) in positions.iter().enumerate() {
            by_asset_id.entry(position.asset_id.clone()).or_insert(idx);
            by_ticker
                .entry(position.ticker.trim().to_uppercase())
                .or_insert(idx);
        }

        Self {
            positions,
            by_asset_id,
            by_ticker,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn by_asset_id(&self, asset_id: &str) -> Option<&HeldPosition> {
        self.by_asset_id.get(asset_id).map(|idx| &self.positions[*idx])
    }

    pub fn by_ticker(&self, ticker: &str) -> Option<&HeldPosition> {
        self.by_ticker
            .get(&ticker.trim().to_uppercase())
            .map(|idx| &self.positions[*idx])
    }

    /// Asset id first, ticker second.
    pub fn resolve(&self, asset_id: Option<&str>, ticker: &str) -> Option<&HeldPosition> {
        asset_id
            .and_then(|id| self.by_asset_id(id))
            .or_else(|| self.by_ticker(ticker))
    }
}
