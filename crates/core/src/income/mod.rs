//! Income events: normalization, classification and deduplication.
//!
//! Provider records flow through this module leaf-first:
//!
//! ```text
//! RawIncomeEvent --(alias table, date/amount parsing)--> normalize_event
//!                --(category_classifier)-------------->  IncomeEvent
//!                --(deduplicator)--------------------->  one IncomeEvent per economic event
//! ```

mod category_classifier;
mod deduplicator;
mod event_normalizer;
mod income_event_model;
mod position_model;
mod raw_event_model;

pub use category_classifier::*;
pub use deduplicator::*;
pub use event_normalizer::*;
pub use income_event_model::*;
pub use position_model::*;
pub use raw_event_model::*;
