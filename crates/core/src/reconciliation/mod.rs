//! Reconciliation pipeline and the stateful calendar service on top of it.

mod income_calendar_service;
mod reconciler;
mod reconciliation_model;

pub use income_calendar_service::*;
pub use reconciler::*;
pub use reconciliation_model::*;

#[cfg(test)]
mod income_calendar_service_tests;
