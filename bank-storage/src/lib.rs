//! Bank Storage
//!
//! RocksDB-backed implementations of the account and ledger
//! persistence ports. One database, five column families; a single
//! [`Storage`] handle serves both ports so the whole bank shares one
//! on-disk home.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod storage;

pub use config::{RocksDBConfig, StorageConfig};
pub use error::{Error, Result};
pub use storage::{Storage, StorageStats};
