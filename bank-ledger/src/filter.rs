//! Search filters and pagination over ledger history.

use crate::types::{Transaction, TransactionKind};
use account_core::{Iban, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default number of entries per search page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Conjunctive filter over ledger entries.
///
/// Every populated field must match for an entry to be included; an
/// empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Inclusive lower bound on the amount.
    pub amount_min: Option<Decimal>,

    /// Inclusive upper bound on the amount.
    pub amount_max: Option<Decimal>,

    /// Inclusive lower bound on the commit timestamp.
    pub from: Option<DateTime<Utc>>,

    /// Inclusive upper bound on the commit timestamp.
    pub to: Option<DateTime<Utc>>,

    /// Exact sender IBAN.
    pub sender_iban: Option<Iban>,

    /// Exact receiver IBAN.
    pub receiver_iban: Option<Iban>,

    /// Sender account owner.
    pub sender_user: Option<UserId>,

    /// Receiver account owner.
    pub receiver_user: Option<UserId>,

    /// Movement kind.
    pub kind: Option<TransactionKind>,

    /// Normalized IBAN prefix matched against either side.
    pub iban_prefix: Option<String>,
}

impl TransactionFilter {
    /// Whether the entry satisfies every populated criterion.
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(min) = self.amount_min {
            if tx.amount < min {
                return false;
            }
        }
        if let Some(max) = self.amount_max {
            if tx.amount > max {
                return false;
            }
        }
        if let Some(from) = self.from {
            if tx.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if tx.timestamp > to {
                return false;
            }
        }
        if let Some(ref iban) = self.sender_iban {
            if tx.sender.as_ref().map(|p| &p.iban) != Some(iban) {
                return false;
            }
        }
        if let Some(ref iban) = self.receiver_iban {
            if tx.receiver.as_ref().map(|p| &p.iban) != Some(iban) {
                return false;
            }
        }
        if let Some(user) = self.sender_user {
            if tx.sender.as_ref().map(|p| p.owner) != Some(user) {
                return false;
            }
        }
        if let Some(user) = self.receiver_user {
            if tx.receiver.as_ref().map(|p| p.owner) != Some(user) {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if tx.kind != kind {
                return false;
            }
        }
        if let Some(ref prefix) = self.iban_prefix {
            let sender_hit = tx
                .sender
                .as_ref()
                .map_or(false, |p| p.iban.as_str().starts_with(prefix.as_str()));
            let receiver_hit = tx
                .receiver
                .as_ref()
                .map_or(false, |p| p.iban.as_str().starts_with(prefix.as_str()));
            if !sender_hit && !receiver_hit {
                return false;
            }
        }
        true
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number, starting at zero.
    pub number: usize,

    /// Entries per page.
    pub size: usize,
}

impl Page {
    /// A page request with an explicit size.
    pub fn new(number: usize, size: usize) -> Self {
        Self { number, size }
    }

    /// The first page at the default size.
    pub fn first() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }

    /// Number of entries to skip before this page begins.
    pub fn offset(&self) -> usize {
        self.number.saturating_mul(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first()
    }
}
