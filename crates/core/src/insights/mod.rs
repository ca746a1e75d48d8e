//! Per-ticker income insights over the trailing 12 months.

mod insight_calculator;
mod insight_model;

pub use insight_calculator::*;
pub use insight_model::*;
