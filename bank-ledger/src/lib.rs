//! Bank Ledger
//!
//! Append-only record of every committed money movement. Entries are
//! immutable once written; balances elsewhere in the system must
//! always be explainable as the sum of ledger entries.
//!
//! The ledger also answers the two read queries the rest of the bank
//! is built on: filtered, paginated search over history, and the
//! per-customer debit sum that feeds daily spending limits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod filter;
pub mod ledger;
pub mod repository;
pub mod types;

pub use error::{Error, Result};
pub use filter::{Page, TransactionFilter};
pub use ledger::Ledger;
pub use repository::{MemoryTransactions, TransactionRepository};
pub use types::{Party, Transaction, TransactionKind};
