//! Income Calendar Core - income-event reconciliation and calendar engine.
//!
//! This crate turns raw dividend/jcp/rendimento records from heterogeneous
//! providers into one canonical event per economic event, then derives a
//! month grid, per-ticker insights and a detail scope from them. Everything
//! below `reconciliation` is pure; the service there owns the only async
//! boundary (provider fetches) and its per-month cache.

pub mod calendar;
pub mod config;
pub mod constants;
pub mod errors;
pub mod income;
pub mod insights;
pub mod provider;
pub mod reconciliation;
pub mod utils;

pub use config::IncomeCalendarConfig;
pub use reconciliation::{
    IncomeCalendarService, IncomeCalendarServiceTrait, IncomeCalendarView,
};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
