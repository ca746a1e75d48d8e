//! Calendar aggregation and view scoping over deduplicated income events.

mod calendar_aggregator;
mod calendar_model;
mod view_scope;

pub use calendar_aggregator::*;
pub use calendar_model::*;
pub use view_scope::*;
