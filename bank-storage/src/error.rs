//! Error types for the storage crate.
//!
//! These cover database lifecycle and configuration. The persistence
//! port implementations translate failures into the port error types
//! of `account-core` and `bank-ledger` instead.

use thiserror::Error;

/// Result type for storage lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Storage lifecycle errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
