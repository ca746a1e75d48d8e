//! Core error types for the income calendar engine.
//!
//! The reconciliation components themselves never fail: unusable provider data
//! is dropped or resolves to `None`. Errors only exist at the edges, where a
//! collaborator (event provider, position provider) or a caller can hand us
//! something we cannot work with.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the income calendar engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Income event provider failed: {0}")]
    Provider(String),

    #[error("Position lookup failed: {0}")]
    Position(String),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("No portfolio selected")]
    NoActiveSelection,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Validation errors for caller-supplied input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid calendar month '{0}', expected YYYY-MM")]
    InvalidMonth(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}
