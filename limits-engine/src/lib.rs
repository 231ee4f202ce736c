//! Limits Engine
//!
//! Per-customer spending limits and the daily allowance calculation.
//!
//! Limits are configuration; spend is never cached here. The daily
//! allowance is recomputed from the ledger on every evaluation, so a
//! rolled-back commit can never leave a stale counter behind. The
//! day window is anchored to the customer's local midnight via a
//! fixed UTC offset.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod calculator;
pub mod error;
pub mod store;
pub mod types;

pub use calculator::{day_start, LimitsCalculator};
pub use error::{Error, Result};
pub use store::LimitsStore;
pub use types::{DailyUsage, LimitsUpdate, UserLimits};
