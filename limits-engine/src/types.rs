//! Limit configuration types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-customer spending limits.
///
/// `absolute_limit` is the default balance floor stamped onto the
/// customer's new accounts; the authoritative copy lives on each
/// account record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLimits {
    /// Largest single debit the customer may make.
    pub transaction_limit: Decimal,

    /// Total the customer may debit within one local day.
    pub daily_transaction_limit: Decimal,

    /// Default balance floor for the customer's accounts. Zero or
    /// negative.
    pub absolute_limit: Decimal,

    /// Minutes east of UTC of the customer's local midnight.
    pub utc_offset_minutes: i32,
}

impl Default for UserLimits {
    fn default() -> Self {
        Self {
            transaction_limit: Decimal::from(2_500),
            daily_transaction_limit: Decimal::from(5_000),
            absolute_limit: Decimal::ZERO,
            utc_offset_minutes: 0,
        }
    }
}

/// Partial update to a customer's limits. `None` keeps the current
/// value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsUpdate {
    /// New single-transaction limit.
    pub transaction_limit: Option<Decimal>,

    /// New daily debit cap.
    pub daily_transaction_limit: Option<Decimal>,

    /// New default balance floor.
    pub absolute_limit: Option<Decimal>,

    /// New local-midnight offset in minutes east of UTC.
    pub utc_offset_minutes: Option<i32>,
}

/// Snapshot of a customer's spend against the daily cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsage {
    /// Start of the customer's current local day, in UTC.
    pub window_start: DateTime<Utc>,

    /// Configured daily debit cap.
    pub daily_transaction_limit: Decimal,

    /// Sum of debits committed since `window_start`.
    pub spent: Decimal,

    /// Cap minus spend, clamped at zero.
    pub remaining: Decimal,
}
