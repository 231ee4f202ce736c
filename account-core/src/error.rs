//! Error types for account management.

use thiserror::Error;

/// Result alias for account operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the account store and its repositories.
#[derive(Debug, Error)]
pub enum Error {
    /// No account matches the given id or IBAN.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// The account exists but is frozen for balance-affecting work.
    #[error("Account is inactive: {0}")]
    Inactive(String),

    /// An account with this IBAN already exists.
    #[error("IBAN already registered: {0}")]
    DuplicateIban(String),

    /// The IBAN fails structural validation.
    #[error("Invalid IBAN: {0}")]
    InvalidIban(String),

    /// Opening the account would break a product rule.
    #[error("Account rule violation: {0}")]
    RuleViolation(String),

    /// Applying the change would break a balance invariant.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The backing store failed.
    #[error("Storage error: {0}")]
    Storage(String),
}
