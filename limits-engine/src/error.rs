//! Error types for the limits engine.

use thiserror::Error;

/// Result alias for limits operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the limits store and calculator.
#[derive(Debug, Error)]
pub enum Error {
    /// The user has no provisioned limits record.
    #[error("No limits configured for user: {0}")]
    NotConfigured(String),

    /// The requested limit values are out of range.
    #[error("Invalid limits: {0}")]
    InvalidLimits(String),

    /// The ledger could not be consulted for spend.
    #[error("Ledger error: {0}")]
    Ledger(String),
}
