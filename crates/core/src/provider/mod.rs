//! Collaborator boundary: income-event and position providers, the per-month
//! fetch cache, and adapters for provider payload shapes.

mod dividend_series;
mod event_cache;
mod provider_traits;

pub use dividend_series::*;
pub use event_cache::*;
pub use provider_traits::*;
