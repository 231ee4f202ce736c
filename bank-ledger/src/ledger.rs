//! The ledger service: entry validation over the repository port.

use crate::error::{Error, Result};
use crate::filter::{Page, TransactionFilter};
use crate::repository::TransactionRepository;
use crate::types::{Transaction, TransactionKind};
use account_core::UserId;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Tolerated forward clock skew on entry timestamps.
const MAX_TIMESTAMP_SKEW_SECS: i64 = 60;

/// Append-only ledger over a [`TransactionRepository`].
///
/// `append` is the only write path. It checks entry shape before
/// anything reaches storage; a malformed entry is a caller bug, never
/// recorded.
pub struct Ledger {
    repository: Arc<dyn TransactionRepository>,
}

impl Ledger {
    /// Create a ledger over the given repository.
    pub fn new(repository: Arc<dyn TransactionRepository>) -> Self {
        Self { repository }
    }

    /// Validate and record an entry, returning it as written.
    pub fn append(&self, tx: Transaction) -> Result<Transaction> {
        self.validate_entry(&tx)?;
        self.repository.append(&tx)?;
        tracing::debug!(
            entry = %tx.id,
            kind = %tx.kind,
            amount = %tx.amount,
            currency = %tx.currency,
            "Ledger entry recorded"
        );
        Ok(tx)
    }

    /// Fetch an entry by id.
    pub fn find(&self, id: Uuid) -> Result<Transaction> {
        self.repository
            .get(id)?
            .ok_or_else(|| Error::EntryNotFound(id.to_string()))
    }

    /// Filtered, paginated search, newest entries first.
    pub fn search(&self, filter: &TransactionFilter, page: Page) -> Result<Vec<Transaction>> {
        self.repository.search(filter, page)
    }

    /// Sum of amounts debited from the user's accounts at or after
    /// `since`. Feeds the daily spending limit.
    pub fn sum_debits_since(&self, user: UserId, since: DateTime<Utc>) -> Result<Decimal> {
        self.repository.sum_debits_since(user, since)
    }

    fn validate_entry(&self, tx: &Transaction) -> Result<()> {
        if tx.amount <= Decimal::ZERO {
            return Err(Error::InvalidEntry(format!(
                "amount must be positive, got {}",
                tx.amount
            )));
        }
        if tx.timestamp > Utc::now() + Duration::seconds(MAX_TIMESTAMP_SKEW_SECS) {
            return Err(Error::InvalidEntry(
                "timestamp is in the future".to_string(),
            ));
        }
        match tx.kind {
            TransactionKind::Deposit => {
                if tx.sender.is_some() || tx.receiver.is_none() {
                    return Err(Error::InvalidEntry(
                        "a deposit carries a receiver and no sender".to_string(),
                    ));
                }
            }
            TransactionKind::Withdrawal => {
                if tx.sender.is_none() || tx.receiver.is_some() {
                    return Err(Error::InvalidEntry(
                        "a withdrawal carries a sender and no receiver".to_string(),
                    ));
                }
            }
            TransactionKind::Transfer => {
                let (sender, receiver) = match (&tx.sender, &tx.receiver) {
                    (Some(s), Some(r)) => (s, r),
                    _ => {
                        return Err(Error::InvalidEntry(
                            "a transfer carries both a sender and a receiver".to_string(),
                        ));
                    }
                };
                if sender.account == receiver.account {
                    return Err(Error::InvalidEntry(
                        "a transfer must move funds between distinct accounts".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}
