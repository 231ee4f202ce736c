//! Core account types shared across the Meridian engines.
//!
//! All monetary values use `rust_decimal::Decimal` for exact decimal
//! arithmetic. Floating point is never used for money.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a bank customer or employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random user id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for an account record.
///
/// Accounts are addressed by IBAN at the edges; the id exists so that
/// renumbering an IBAN (bank migration) never rewrites ledger history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Generate a fresh random account id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// International Bank Account Number, stored in normalized form.
///
/// Normalization strips whitespace and upcases, so `nl91 meri 01` and
/// `NL91MERI01` compare equal everywhere in the system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Iban(String);

impl Iban {
    /// Normalize and wrap a raw IBAN string.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized: String = raw
            .as_ref()
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Self(normalized)
    }

    /// The normalized IBAN string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-letter country prefix, if present.
    pub fn country_code(&self) -> Option<&str> {
        if self.0.len() >= 2 {
            Some(&self.0[..2])
        } else {
            None
        }
    }
}

impl fmt::Display for Iban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Currencies accounts can be denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Currency {
    /// Euro
    EUR,
    /// US Dollar
    USD,
    /// British Pound
    GBP,
    /// Swiss Franc
    CHF,
}

impl Currency {
    /// ISO 4217 currency code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::GBP => "GBP",
            Currency::CHF => "CHF",
        }
    }

    /// Parse an ISO 4217 code, case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "EUR" => Some(Currency::EUR),
            "USD" => Some(Currency::USD),
            "GBP" => Some(Currency::GBP),
            "CHF" => Some(Currency::CHF),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The two retail account products.
///
/// A customer holds at most one of each, and a SAVING account never
/// exists without the owner's CURRENT account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    /// Day-to-day payment account.
    Current,
    /// Savings pocket tied to the owner's current account.
    Saving,
}

impl AccountType {
    /// Wire-format name of the account type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Current => "CURRENT",
            AccountType::Saving => "SAVING",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer account record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable record identifier.
    pub id: AccountId,

    /// Owning customer.
    pub owner: UserId,

    /// Externally visible account number, unique bank-wide.
    pub iban: Iban,

    /// Product type of the account.
    pub kind: AccountType,

    /// Currency the balance is denominated in.
    pub currency: Currency,

    /// Current balance.
    pub balance: Decimal,

    /// Lowest balance the account may reach. Zero or negative; a
    /// negative floor is an overdraft allowance.
    pub absolute_limit: Decimal,

    /// Inactive accounts reject every balance-affecting operation.
    pub active: bool,

    /// When the account was opened.
    pub opened_at: DateTime<Utc>,
}

impl Account {
    /// Amount that can still be debited before the balance floor.
    pub fn headroom(&self) -> Decimal {
        self.balance - self.absolute_limit
    }

    /// Whether debiting `amount` would keep the balance at or above
    /// the floor.
    pub fn can_debit(&self, amount: Decimal) -> bool {
        self.balance - amount >= self.absolute_limit
    }
}

/// Parameters for opening a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    /// Owning customer.
    pub owner: UserId,

    /// Requested IBAN, validated and checked for uniqueness on open.
    pub iban: Iban,

    /// Product type to open.
    pub kind: AccountType,

    /// Denomination currency.
    pub currency: Currency,

    /// Opening balance. Must not start below the floor.
    pub initial_balance: Decimal,

    /// Balance floor for the new account.
    pub absolute_limit: Decimal,
}

impl NewAccount {
    /// A CURRENT account opened empty with a zero floor.
    pub fn current(owner: UserId, iban: Iban, currency: Currency) -> Self {
        Self {
            owner,
            iban,
            kind: AccountType::Current,
            currency,
            initial_balance: Decimal::ZERO,
            absolute_limit: Decimal::ZERO,
        }
    }

    /// A SAVING account opened empty with a zero floor.
    pub fn saving(owner: UserId, iban: Iban, currency: Currency) -> Self {
        Self {
            owner,
            iban,
            kind: AccountType::Saving,
            currency,
            initial_balance: Decimal::ZERO,
            absolute_limit: Decimal::ZERO,
        }
    }
}
