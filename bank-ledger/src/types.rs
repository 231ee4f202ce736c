//! Ledger entry types.

use account_core::{Account, AccountId, Currency, Iban, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The three movement kinds the bank records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Cash paid into an account. No sender party.
    Deposit,
    /// Cash taken out of an account. No receiver party.
    Withdrawal,
    /// Funds moved between two accounts.
    Transfer,
}

impl TransactionKind {
    /// Wire-format name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEPOSIT" => Ok(TransactionKind::Deposit),
            "WITHDRAWAL" => Ok(TransactionKind::Withdrawal),
            "TRANSFER" => Ok(TransactionKind::Transfer),
            _ => Err(()),
        }
    }
}

/// One side of a movement, denormalized at commit time.
///
/// The IBAN and owner are captured as they were when the entry was
/// written, so later account changes never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Account the funds moved out of or into.
    pub account: AccountId,

    /// IBAN of that account at commit time.
    pub iban: Iban,

    /// Owner of that account at commit time.
    pub owner: UserId,
}

impl Party {
    /// Capture a party from an account record.
    pub fn from_account(account: &Account) -> Self {
        Self {
            account: account.id,
            iban: account.iban.clone(),
            owner: account.owner,
        }
    }
}

/// An immutable ledger entry.
///
/// The party pattern is tied to the kind: deposits have only a
/// receiver, withdrawals only a sender, transfers both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Time-ordered entry id (UUIDv7).
    pub id: Uuid,

    /// When the entry was committed.
    pub timestamp: DateTime<Utc>,

    /// Debited side, absent for deposits.
    pub sender: Option<Party>,

    /// Credited side, absent for withdrawals.
    pub receiver: Option<Party>,

    /// Moved amount, always positive.
    pub amount: Decimal,

    /// Currency of the movement.
    pub currency: Currency,

    /// Movement kind.
    pub kind: TransactionKind,

    /// User who initiated the movement.
    pub initiated_by: UserId,

    /// Free-text description shown on statements.
    pub description: String,
}

impl Transaction {
    /// Build a deposit entry.
    pub fn deposit(
        receiver: Party,
        amount: Decimal,
        currency: Currency,
        initiated_by: UserId,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            sender: None,
            receiver: Some(receiver),
            amount,
            currency,
            kind: TransactionKind::Deposit,
            initiated_by,
            description: description.into(),
        }
    }

    /// Build a withdrawal entry.
    pub fn withdrawal(
        sender: Party,
        amount: Decimal,
        currency: Currency,
        initiated_by: UserId,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            sender: Some(sender),
            receiver: None,
            amount,
            currency,
            kind: TransactionKind::Withdrawal,
            initiated_by,
            description: description.into(),
        }
    }

    /// Build a transfer entry.
    pub fn transfer(
        sender: Party,
        receiver: Party,
        amount: Decimal,
        currency: Currency,
        initiated_by: UserId,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            sender: Some(sender),
            receiver: Some(receiver),
            amount,
            currency,
            kind: TransactionKind::Transfer,
            initiated_by,
            description: description.into(),
        }
    }

    /// Whether this entry debits the given user's funds.
    ///
    /// Deposits never debit anyone; withdrawals and transfers debit
    /// the sender's owner.
    pub fn debits(&self, user: UserId) -> bool {
        self.sender.as_ref().map_or(false, |p| p.owner == user)
    }
}
