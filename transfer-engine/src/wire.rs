//! Request and response shapes.
//!
//! Field names here are consumed by external callers and must stay
//! stable. Amounts cross the wire as decimal strings.

use bank_ledger::{Transaction, TransactionKind};
use account_core::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to move funds between two accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    /// IBAN of the account to debit.
    pub sender_iban: String,

    /// IBAN of the account to credit.
    pub receiver_iban: String,

    /// Amount to move.
    pub amount: Decimal,

    /// Statement description.
    pub description: String,
}

/// Request to credit cash into an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
    /// IBAN of the account to credit.
    pub iban: String,

    /// Amount to credit.
    pub amount: Decimal,

    /// Currency the cash is denominated in.
    pub currency_type: Currency,
}

/// Request to debit cash out of an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    /// IBAN of the account to debit.
    pub iban: String,

    /// Amount to debit.
    pub amount: Decimal,

    /// Currency the cash should be paid out in.
    pub currency_type: Currency,
}

/// Ledger search parameters. Every field is optional; absent fields
/// do not constrain the result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionSearchQuery {
    /// Lower bound on the amount, inclusive.
    pub amount_min: Option<Decimal>,

    /// Upper bound on the amount, inclusive.
    pub amount_max: Option<Decimal>,

    /// Earliest timestamp, inclusive.
    pub from: Option<DateTime<Utc>>,

    /// Latest timestamp, inclusive.
    pub to: Option<DateTime<Utc>>,

    /// Exact sender IBAN.
    pub sender_iban: Option<String>,

    /// Exact receiver IBAN.
    pub receiver_iban: Option<String>,

    /// Sender's owning user.
    pub sender_user_id: Option<Uuid>,

    /// Receiver's owning user.
    pub receiver_user_id: Option<Uuid>,

    /// Movement kind name, case-insensitive.
    pub transaction_type: Option<String>,

    /// Prefix matched against either party's IBAN.
    pub iban: Option<String>,

    /// Zero-based page number.
    pub page: Option<u32>,

    /// Entries per page.
    pub page_size: Option<u32>,
}

/// A ledger entry as callers see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// Entry id.
    pub id: Uuid,

    /// Display name of the initiating user.
    pub username: String,

    /// Debited IBAN, absent for deposits.
    pub sender_iban: Option<String>,

    /// Credited IBAN, absent for withdrawals.
    pub receiver_iban: Option<String>,

    /// Moved amount.
    pub amount: Decimal,

    /// Currency of the movement.
    pub currency_type: Currency,

    /// Commit time.
    pub timestamp: DateTime<Utc>,

    /// Statement description.
    pub description: String,

    /// Movement kind.
    pub transaction_type: TransactionKind,
}

impl TransactionResponse {
    /// Projects a ledger entry into the caller-facing shape.
    pub fn from_entry(entry: &Transaction, username: String) -> Self {
        Self {
            id: entry.id,
            username,
            sender_iban: entry
                .sender
                .as_ref()
                .map(|party| party.iban.as_str().to_owned()),
            receiver_iban: entry
                .receiver
                .as_ref()
                .map(|party| party.iban.as_str().to_owned()),
            amount: entry.amount,
            currency_type: entry.currency,
            timestamp: entry.timestamp,
            description: entry.description.clone(),
            transaction_type: entry.kind,
        }
    }
}
