//! Daily allowance calculation.
//!
//! Spend is derived from the ledger at evaluation time. The limits
//! engine holds no running counters, so there is nothing to desync
//! when a commit is rolled back or the process restarts.

use crate::error::{Error, Result};
use crate::store::LimitsStore;
use crate::types::DailyUsage;
use account_core::UserId;
use bank_ledger::Ledger;
use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Start of the local day containing `as_of`, expressed in UTC.
///
/// The offset is fixed per customer; an out-of-range offset falls
/// back to UTC rather than failing the evaluation.
pub fn day_start(as_of: DateTime<Utc>, utc_offset_minutes: i32) -> DateTime<Utc> {
    let offset =
        FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix());
    let local_midnight = as_of
        .with_timezone(&offset)
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time of day");
    offset
        .from_local_datetime(&local_midnight)
        .single()
        .expect("fixed offsets map local times unambiguously")
        .with_timezone(&Utc)
}

/// Computes how much of the daily debit cap a customer has left.
pub struct LimitsCalculator {
    limits: Arc<LimitsStore>,
    ledger: Arc<Ledger>,
}

impl LimitsCalculator {
    /// Create a calculator over the given stores.
    pub fn new(limits: Arc<LimitsStore>, ledger: Arc<Ledger>) -> Self {
        Self { limits, ledger }
    }

    /// The customer's spend and remaining allowance as of `as_of`.
    ///
    /// Callers that gate a debit on the result must invoke this while
    /// holding the owner's exclusive section, or the answer can go
    /// stale before the debit commits.
    pub fn remaining(&self, user: UserId, as_of: DateTime<Utc>) -> Result<DailyUsage> {
        let limits = self.limits.get(user)?;
        let window_start = day_start(as_of, limits.utc_offset_minutes);
        let spent = self
            .ledger
            .sum_debits_since(user, window_start)
            .map_err(|e| Error::Ledger(e.to_string()))?;
        let remaining = (limits.daily_transaction_limit - spent).max(Decimal::ZERO);
        Ok(DailyUsage {
            window_start,
            daily_transaction_limit: limits.daily_transaction_limit,
            spent,
            remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserLimits;
    use account_core::{AccountId, Currency, Iban};
    use bank_ledger::{MemoryTransactions, Party, Transaction};
    use chrono::Duration;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn day_start_at_utc() {
        let as_of = utc(2025, 3, 10, 15, 30);
        assert_eq!(day_start(as_of, 0), utc(2025, 3, 10, 0, 0));
    }

    #[test]
    fn day_start_east_of_utc() {
        // 22:30 UTC is already 00:30 next day at UTC+2.
        let as_of = utc(2025, 3, 10, 22, 30);
        assert_eq!(day_start(as_of, 120), utc(2025, 3, 10, 22, 0));
    }

    #[test]
    fn day_start_west_of_utc() {
        // 03:00 UTC is still 22:00 the previous day at UTC-5.
        let as_of = utc(2025, 3, 11, 3, 0);
        assert_eq!(day_start(as_of, -300), utc(2025, 3, 10, 5, 0));
    }

    #[test]
    fn day_start_out_of_range_offset_falls_back_to_utc() {
        let as_of = utc(2025, 3, 10, 15, 30);
        assert_eq!(day_start(as_of, 100_000), utc(2025, 3, 10, 0, 0));
    }

    fn calculator_with_ledger() -> (LimitsCalculator, Arc<LimitsStore>, Arc<Ledger>) {
        let limits = Arc::new(LimitsStore::new());
        let ledger = Arc::new(Ledger::new(Arc::new(MemoryTransactions::new())));
        let calculator = LimitsCalculator::new(Arc::clone(&limits), Arc::clone(&ledger));
        (calculator, limits, ledger)
    }

    fn party(owner: UserId) -> Party {
        Party {
            account: AccountId::new(),
            iban: Iban::new("NL91MERI0000000001"),
            owner,
        }
    }

    #[test]
    fn remaining_subtracts_todays_debits() {
        let (calculator, limits, ledger) = calculator_with_ledger();
        let user = UserId::new();
        limits
            .provision(
                user,
                UserLimits {
                    daily_transaction_limit: Decimal::from(100),
                    ..Default::default()
                },
            )
            .unwrap();

        ledger
            .append(Transaction::withdrawal(
                party(user),
                Decimal::from(30),
                Currency::EUR,
                user,
                "Cash withdrawal",
            ))
            .unwrap();

        let usage = calculator.remaining(user, Utc::now()).unwrap();
        assert_eq!(usage.spent, Decimal::from(30));
        assert_eq!(usage.remaining, Decimal::from(70));
    }

    #[test]
    fn remaining_is_clamped_at_zero() {
        let (calculator, limits, ledger) = calculator_with_ledger();
        let user = UserId::new();
        limits
            .provision(
                user,
                UserLimits {
                    daily_transaction_limit: Decimal::from(100),
                    transaction_limit: Decimal::from(1_000),
                    ..Default::default()
                },
            )
            .unwrap();

        // Lowering the cap after spend can push usage past it.
        ledger
            .append(Transaction::withdrawal(
                party(user),
                Decimal::from(150),
                Currency::EUR,
                user,
                "Cash withdrawal",
            ))
            .unwrap();

        let usage = calculator.remaining(user, Utc::now()).unwrap();
        assert_eq!(usage.spent, Decimal::from(150));
        assert_eq!(usage.remaining, Decimal::ZERO);
    }

    #[test]
    fn yesterdays_spend_does_not_count() {
        let (calculator, limits, ledger) = calculator_with_ledger();
        let user = UserId::new();
        limits.provision(user, UserLimits::default()).unwrap();

        let mut old = Transaction::withdrawal(
            party(user),
            Decimal::from(400),
            Currency::EUR,
            user,
            "Cash withdrawal",
        );
        old.timestamp = Utc::now() - Duration::days(2);
        ledger.append(old).unwrap();

        let usage = calculator.remaining(user, Utc::now()).unwrap();
        assert_eq!(usage.spent, Decimal::ZERO);
        assert_eq!(usage.remaining, usage.daily_transaction_limit);
    }

    #[test]
    fn unconfigured_user_fails() {
        let (calculator, _, _) = calculator_with_ledger();
        assert!(matches!(
            calculator.remaining(UserId::new(), Utc::now()),
            Err(Error::NotConfigured(_))
        ));
    }
}
