//! Transfer Engine
//!
//! The transaction core of the Meridian retail bank: cash deposits,
//! cash withdrawals and account-to-account transfers, each validated
//! against account state, per-customer limits and the caller's role
//! before anything is committed.
//!
//! # Commit discipline
//!
//! Every money operation runs in two phases inside an exclusive
//! section over the involved account owners:
//!
//! 1. **Validate** - re-read the accounts and evaluate every rule,
//!    including the ledger-derived daily allowance.
//! 2. **Commit** - apply the balance deltas and append the ledger
//!    entry, rolling the deltas back in reverse order if a later step
//!    fails.
//!
//! Because the daily allowance is recomputed from the ledger inside
//! the same exclusive section that commits the debit, two concurrent
//! debits can never both squeeze under the cap.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod locks;
pub mod metrics;
pub mod state;
pub mod wire;

pub use auth::{is_permitted, AccessDecision, AuthorizationGuard, Capability, Role, RoleGuard};
pub use config::EngineConfig;
pub use engine::{TransferEngine, DEPOSIT_DESCRIPTION, WITHDRAWAL_DESCRIPTION};
pub use error::{Result, TransferError};
pub use locks::OwnerLocks;
pub use metrics::EngineMetrics;
pub use state::RequestState;
pub use wire::{
    DepositRequest, TransactionResponse, TransactionSearchQuery, TransferRequest, WithdrawRequest,
};
