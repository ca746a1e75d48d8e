use async_trait::async_trait;

use crate::calendar::CalendarMonth;
use crate::errors::Result;
use crate::income::{HeldPosition, RawIncomeEvent};

/// Source of raw income records for one portfolio and month.
#[async_trait]
pub trait IncomeEventProviderTrait: Send + Sync {
    async fn fetch_month(
        &self,
        portfolio_id: &str,
        month: CalendarMonth,
    ) -> Result<Vec<RawIncomeEvent>>;
}

/// Source of the holdings used for quantities, prices and costs.
#[async_trait]
pub trait PositionProviderTrait: Send + Sync {
    async fn get_positions(&self, portfolio_id: &str) -> Result<Vec<HeldPosition>>;
}
