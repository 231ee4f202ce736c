//! Account store: product rules layered over the repository port.

use crate::error::{Error, Result};
use crate::iban::IbanValidator;
use crate::repository::AccountRepository;
use crate::types::{Account, AccountId, AccountType, Iban, NewAccount, UserId};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Front door for account lookups, creation and balance mutation.
///
/// The store enforces product rules (one CURRENT per customer, SAVING
/// only next to CURRENT, sane floors); record-level invariants such as
/// the balance floor live in the repository so they hold under
/// concurrent deltas as well.
pub struct AccountStore {
    repository: Arc<dyn AccountRepository>,
    iban_validator: Arc<dyn IbanValidator>,
}

impl AccountStore {
    /// Create a store over the given repository and validator.
    pub fn new(
        repository: Arc<dyn AccountRepository>,
        iban_validator: Arc<dyn IbanValidator>,
    ) -> Self {
        Self {
            repository,
            iban_validator,
        }
    }

    /// Open a new account after product-rule validation.
    pub fn open_account(&self, new: NewAccount) -> Result<Account> {
        if !self.iban_validator.is_valid(new.iban.as_str()) {
            return Err(Error::InvalidIban(new.iban.to_string()));
        }
        if new.absolute_limit > Decimal::ZERO {
            return Err(Error::RuleViolation(format!(
                "absolute limit must be zero or negative, got {}",
                new.absolute_limit
            )));
        }
        if new.initial_balance < new.absolute_limit {
            return Err(Error::RuleViolation(format!(
                "initial balance {} starts below the floor {}",
                new.initial_balance, new.absolute_limit
            )));
        }

        let existing = self.repository.list_by_owner(new.owner)?;
        let has_current = existing.iter().any(|a| a.kind == AccountType::Current);
        let has_saving = existing.iter().any(|a| a.kind == AccountType::Saving);
        match new.kind {
            AccountType::Current if has_current => {
                return Err(Error::RuleViolation(
                    "customer already holds a CURRENT account".to_string(),
                ));
            }
            AccountType::Saving if has_saving => {
                return Err(Error::RuleViolation(
                    "customer already holds a SAVING account".to_string(),
                ));
            }
            AccountType::Saving if !has_current => {
                return Err(Error::RuleViolation(
                    "a SAVING account requires the customer's CURRENT account".to_string(),
                ));
            }
            _ => {}
        }

        let account = Account {
            id: AccountId::new(),
            owner: new.owner,
            iban: new.iban,
            kind: new.kind,
            currency: new.currency,
            balance: new.initial_balance,
            absolute_limit: new.absolute_limit,
            active: true,
            opened_at: Utc::now(),
        };
        self.repository.insert(&account)?;

        tracing::info!(
            account = %account.iban,
            owner = %account.owner,
            kind = %account.kind,
            currency = %account.currency,
            "Account opened"
        );
        Ok(account)
    }

    /// Fetch an account by id.
    pub fn find_by_id(&self, id: AccountId) -> Result<Account> {
        self.repository
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Fetch an account by IBAN.
    pub fn find_by_iban(&self, iban: &Iban) -> Result<Account> {
        self.repository
            .get_by_iban(iban)?
            .ok_or_else(|| Error::NotFound(iban.to_string()))
    }

    /// All accounts owned by a user.
    pub fn list_by_owner(&self, owner: UserId) -> Result<Vec<Account>> {
        self.repository.list_by_owner(owner)
    }

    /// Apply a signed balance delta atomically.
    pub fn apply_balance_delta(&self, id: AccountId, delta: Decimal) -> Result<Account> {
        let account = self.repository.apply_delta(id, delta)?;
        tracing::debug!(
            account = %account.iban,
            delta = %delta,
            balance = %account.balance,
            "Balance delta applied"
        );
        Ok(account)
    }

    /// Freeze or unfreeze an account.
    pub fn set_active(&self, id: AccountId, active: bool) -> Result<Account> {
        let account = self.repository.set_active(id, active)?;
        tracing::info!(account = %account.iban, active, "Account active flag changed");
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iban::StructuralIbanValidator;
    use crate::repository::MemoryAccounts;
    use crate::types::Currency;

    fn store() -> AccountStore {
        AccountStore::new(
            Arc::new(MemoryAccounts::new()),
            Arc::new(StructuralIbanValidator::new()),
        )
    }

    fn iban(n: u32) -> Iban {
        Iban::new(format!("NL91MERI{:010}", n))
    }

    #[test]
    fn open_current_then_saving() {
        let store = store();
        let owner = UserId::new();

        let current = store
            .open_account(NewAccount::current(owner, iban(1), Currency::EUR))
            .unwrap();
        assert_eq!(current.kind, AccountType::Current);
        assert!(current.active);

        let saving = store
            .open_account(NewAccount::saving(owner, iban(2), Currency::EUR))
            .unwrap();
        assert_eq!(saving.kind, AccountType::Saving);
        assert_eq!(store.list_by_owner(owner).unwrap().len(), 2);
    }

    #[test]
    fn saving_without_current_rejected() {
        let store = store();
        let owner = UserId::new();

        let err = store
            .open_account(NewAccount::saving(owner, iban(1), Currency::EUR))
            .unwrap_err();
        assert!(matches!(err, Error::RuleViolation(_)));
    }

    #[test]
    fn second_current_rejected() {
        let store = store();
        let owner = UserId::new();

        store
            .open_account(NewAccount::current(owner, iban(1), Currency::EUR))
            .unwrap();
        let err = store
            .open_account(NewAccount::current(owner, iban(2), Currency::EUR))
            .unwrap_err();
        assert!(matches!(err, Error::RuleViolation(_)));
    }

    #[test]
    fn second_saving_rejected() {
        let store = store();
        let owner = UserId::new();

        store
            .open_account(NewAccount::current(owner, iban(1), Currency::EUR))
            .unwrap();
        store
            .open_account(NewAccount::saving(owner, iban(2), Currency::EUR))
            .unwrap();
        let err = store
            .open_account(NewAccount::saving(owner, iban(3), Currency::EUR))
            .unwrap_err();
        assert!(matches!(err, Error::RuleViolation(_)));
    }

    #[test]
    fn malformed_iban_rejected() {
        let store = store();
        let err = store
            .open_account(NewAccount::current(
                UserId::new(),
                Iban::new("not-an-iban"),
                Currency::EUR,
            ))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidIban(_)));
    }

    #[test]
    fn positive_floor_rejected() {
        let store = store();
        let mut new = NewAccount::current(UserId::new(), iban(1), Currency::EUR);
        new.absolute_limit = Decimal::ONE;
        assert!(matches!(
            store.open_account(new),
            Err(Error::RuleViolation(_))
        ));
    }

    #[test]
    fn lookup_by_iban_and_id() {
        let store = store();
        let owner = UserId::new();
        let opened = store
            .open_account(NewAccount::current(owner, iban(7), Currency::USD))
            .unwrap();

        assert_eq!(store.find_by_id(opened.id).unwrap().iban, opened.iban);
        assert_eq!(store.find_by_iban(&iban(7)).unwrap().id, opened.id);
        assert!(matches!(
            store.find_by_iban(&iban(8)),
            Err(Error::NotFound(_))
        ));
    }
}
