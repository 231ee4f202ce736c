//! Account Core
//!
//! Account records, balances and the ports behind which the Meridian
//! engines keep them. The crate owns the invariants that must hold for
//! every account no matter which storage backend is wired in: IBAN
//! uniqueness, the balance floor, and the inactive-account freeze.
//!
//! Balance mutations go through [`AccountStore::apply_balance_delta`],
//! which applies a signed delta atomically at the repository level.
//! Callers that need multi-account atomicity coordinate above this
//! crate; the repository guarantees that a single delta is checked and
//! applied as one step.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod directory;
pub mod error;
pub mod iban;
pub mod repository;
pub mod store;
pub mod types;

pub use directory::{MemoryUserDirectory, UserDirectory};
pub use error::{Error, Result};
pub use iban::{IbanValidator, StructuralIbanValidator};
pub use repository::{AccountRepository, MemoryAccounts};
pub use store::AccountStore;
pub use types::{Account, AccountId, AccountType, Currency, Iban, NewAccount, UserId};
