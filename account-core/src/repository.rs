//! Account persistence port and the in-memory reference implementation.

use crate::error::{Error, Result};
use crate::types::{Account, AccountId, Iban, UserId};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Storage port for account records.
///
/// Implementations must make each method atomic with respect to the
/// others: `insert` checks IBAN uniqueness and writes in one step, and
/// `apply_delta` performs its read-check-write without interleaving.
pub trait AccountRepository: Send + Sync {
    /// Fetch an account by id.
    fn get(&self, id: AccountId) -> Result<Option<Account>>;

    /// Fetch an account by IBAN.
    fn get_by_iban(&self, iban: &Iban) -> Result<Option<Account>>;

    /// All accounts owned by a user, in no particular order.
    fn list_by_owner(&self, owner: UserId) -> Result<Vec<Account>>;

    /// Persist a new account. Fails with [`Error::DuplicateIban`] if
    /// the IBAN is already registered.
    fn insert(&self, account: &Account) -> Result<()>;

    /// Flip the active flag, returning the updated record.
    fn set_active(&self, id: AccountId, active: bool) -> Result<Account>;

    /// Apply a signed balance delta atomically, returning the updated
    /// record.
    ///
    /// The delta is rejected with [`Error::Inactive`] on a frozen
    /// account and [`Error::InvariantViolation`] if the resulting
    /// balance would sink below the account's floor. Both checks read
    /// the record inside the same critical section as the write.
    fn apply_delta(&self, id: AccountId, delta: Decimal) -> Result<Account>;
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    by_iban: HashMap<Iban, AccountId>,
}

/// In-memory account repository.
///
/// Backs unit tests and the traffic simulator. A single `RwLock`
/// covers both maps so the IBAN index can never drift from the
/// primary records.
#[derive(Default)]
pub struct MemoryAccounts {
    inner: RwLock<Inner>,
}

impl MemoryAccounts {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        self.inner.read().accounts.len()
    }

    /// Whether the repository holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AccountRepository for MemoryAccounts {
    fn get(&self, id: AccountId) -> Result<Option<Account>> {
        Ok(self.inner.read().accounts.get(&id).cloned())
    }

    fn get_by_iban(&self, iban: &Iban) -> Result<Option<Account>> {
        let inner = self.inner.read();
        Ok(inner
            .by_iban
            .get(iban)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }

    fn list_by_owner(&self, owner: UserId) -> Result<Vec<Account>> {
        Ok(self
            .inner
            .read()
            .accounts
            .values()
            .filter(|a| a.owner == owner)
            .cloned()
            .collect())
    }

    fn insert(&self, account: &Account) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.by_iban.contains_key(&account.iban) {
            return Err(Error::DuplicateIban(account.iban.to_string()));
        }
        inner.by_iban.insert(account.iban.clone(), account.id);
        inner.accounts.insert(account.id, account.clone());
        Ok(())
    }

    fn set_active(&self, id: AccountId, active: bool) -> Result<Account> {
        let mut inner = self.inner.write();
        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        account.active = active;
        Ok(account.clone())
    }

    fn apply_delta(&self, id: AccountId, delta: Decimal) -> Result<Account> {
        let mut inner = self.inner.write();
        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if !account.active {
            return Err(Error::Inactive(account.iban.to_string()));
        }
        let new_balance = account.balance + delta;
        if new_balance < account.absolute_limit {
            return Err(Error::InvariantViolation(format!(
                "balance {} would sink below floor {} on account {}",
                new_balance, account.absolute_limit, account.iban
            )));
        }
        account.balance = new_balance;
        Ok(account.clone())
    }
}
