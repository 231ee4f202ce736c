//! Error types for the ledger.

use thiserror::Error;

/// Result alias for ledger operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the ledger and its repositories.
#[derive(Debug, Error)]
pub enum Error {
    /// The entry is malformed and must not be recorded.
    #[error("Invalid ledger entry: {0}")]
    InvalidEntry(String),

    /// No entry with the given id exists.
    #[error("Ledger entry not found: {0}")]
    EntryNotFound(String),

    /// The backing store failed.
    #[error("Storage error: {0}")]
    Storage(String),
}
