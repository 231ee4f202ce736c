//! The transfer engine.
//!
//! Each operation validates fully before mutating anything, and runs
//! the validate-then-commit sequence inside an exclusive section over
//! every owner it touches. The daily-allowance read happens inside
//! that same section, so two concurrent debits can never both pass
//! against the same remaining allowance.

use std::sync::Arc;
use std::time::Instant;

use account_core::{
    Account, AccountId, AccountStore, AccountType, Currency, Iban, UserDirectory, UserId,
};
use bank_ledger::{
    Ledger, Page, Party, Transaction, TransactionFilter, TransactionKind,
};
use chrono::Utc;
use limits_engine::{DailyUsage, LimitsCalculator, LimitsStore, LimitsUpdate, UserLimits};
use rust_decimal::Decimal;

use crate::auth::{AuthorizationGuard, Capability};
use crate::config::EngineConfig;
use crate::error::{Result, TransferError};
use crate::locks::OwnerLocks;
use crate::metrics::EngineMetrics;
use crate::state::RequestState;
use crate::wire::{
    DepositRequest, TransactionResponse, TransactionSearchQuery, TransferRequest, WithdrawRequest,
};

/// Statement description stamped on cash deposits.
pub const DEPOSIT_DESCRIPTION: &str = "Cash deposit";

/// Statement description stamped on cash withdrawals.
pub const WITHDRAWAL_DESCRIPTION: &str = "Cash withdrawal";

/// Orchestrates balance movements across accounts, limits and ledger.
pub struct TransferEngine {
    accounts: Arc<AccountStore>,
    ledger: Arc<Ledger>,
    limits: Arc<LimitsStore>,
    calculator: LimitsCalculator,
    guard: Arc<dyn AuthorizationGuard>,
    directory: Arc<dyn UserDirectory>,
    locks: OwnerLocks,
    metrics: EngineMetrics,
    config: EngineConfig,
}

impl TransferEngine {
    /// Create a new engine over the given collaborators.
    pub fn new(
        accounts: Arc<AccountStore>,
        ledger: Arc<Ledger>,
        limits: Arc<LimitsStore>,
        guard: Arc<dyn AuthorizationGuard>,
        directory: Arc<dyn UserDirectory>,
        config: EngineConfig,
    ) -> Result<Self> {
        let calculator = LimitsCalculator::new(Arc::clone(&limits), Arc::clone(&ledger));
        let metrics = EngineMetrics::new()
            .map_err(|e| TransferError::Internal(format!("Failed to create metrics: {}", e)))?;
        Ok(Self {
            accounts,
            ledger,
            limits,
            calculator,
            guard,
            directory,
            locks: OwnerLocks::new(),
            metrics,
            config,
        })
    }

    /// Get metrics collector
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Get engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Credit cash into the account with the given IBAN.
    pub fn deposit(
        &self,
        request: &DepositRequest,
        initiated_by: UserId,
    ) -> Result<TransactionResponse> {
        let started = Instant::now();
        tracing::debug!(
            iban = %request.iban,
            amount = %request.amount,
            state = %RequestState::Received,
            "Deposit received"
        );
        let result = self.deposit_inner(request, initiated_by);
        self.observe("deposit", &self.metrics.deposits_total, started, result)
            .map(|entry| self.to_response(entry))
    }

    /// Debit cash out of the account with the given IBAN.
    pub fn withdraw(
        &self,
        request: &WithdrawRequest,
        initiated_by: UserId,
    ) -> Result<TransactionResponse> {
        let started = Instant::now();
        tracing::debug!(
            iban = %request.iban,
            amount = %request.amount,
            state = %RequestState::Received,
            "Withdrawal received"
        );
        let result = self.withdraw_inner(request, initiated_by);
        self.observe("withdraw", &self.metrics.withdrawals_total, started, result)
            .map(|entry| self.to_response(entry))
    }

    /// Move funds from the sender account to the receiver account.
    pub fn transfer(
        &self,
        request: &TransferRequest,
        initiated_by: UserId,
    ) -> Result<TransactionResponse> {
        let started = Instant::now();
        tracing::debug!(
            sender_iban = %request.sender_iban,
            receiver_iban = %request.receiver_iban,
            amount = %request.amount,
            state = %RequestState::Received,
            "Transfer received"
        );
        let result = self.transfer_inner(request, initiated_by);
        self.observe("transfer", &self.metrics.transfers_total, started, result)
            .map(|entry| self.to_response(entry))
    }

    fn deposit_inner(
        &self,
        request: &DepositRequest,
        initiated_by: UserId,
    ) -> Result<Transaction> {
        let amount = positive_amount(request.amount)?;
        let target = self.accounts.find_by_iban(&Iban::new(&request.iban))?;

        self.locks.with_exclusive(&[target.owner], || {
            tracing::debug!(
                account = %target.id,
                state = %RequestState::Validating,
                "Validating deposit"
            );
            let account = self.accounts.find_by_id(target.id)?;
            ensure_active(&account)?;
            ensure_currency(&account, request.currency_type)?;
            self.authorize(initiated_by, Capability::Deposit, account.owner)?;

            let account = self.accounts.apply_balance_delta(account.id, amount)?;
            let entry = Transaction::deposit(
                Party::from_account(&account),
                amount,
                account.currency,
                initiated_by,
                DEPOSIT_DESCRIPTION,
            );
            match self.ledger.append(entry) {
                Ok(entry) => Ok(entry),
                Err(err) => {
                    self.undo_delta(account.id, -amount);
                    Err(err.into())
                }
            }
        })
    }

    fn withdraw_inner(
        &self,
        request: &WithdrawRequest,
        initiated_by: UserId,
    ) -> Result<Transaction> {
        let amount = positive_amount(request.amount)?;
        let target = self.accounts.find_by_iban(&Iban::new(&request.iban))?;

        self.locks.with_exclusive(&[target.owner], || {
            tracing::debug!(
                account = %target.id,
                state = %RequestState::Validating,
                "Validating withdrawal"
            );
            let account = self.accounts.find_by_id(target.id)?;
            ensure_active(&account)?;
            ensure_currency(&account, request.currency_type)?;
            self.authorize(initiated_by, Capability::Withdraw, account.owner)?;
            self.check_debit_limits(account.owner, amount)?;
            ensure_floor(&account, amount)?;

            let account = self.accounts.apply_balance_delta(account.id, -amount)?;
            let entry = Transaction::withdrawal(
                Party::from_account(&account),
                amount,
                account.currency,
                initiated_by,
                WITHDRAWAL_DESCRIPTION,
            );
            match self.ledger.append(entry) {
                Ok(entry) => Ok(entry),
                Err(err) => {
                    self.undo_delta(account.id, amount);
                    Err(err.into())
                }
            }
        })
    }

    fn transfer_inner(
        &self,
        request: &TransferRequest,
        initiated_by: UserId,
    ) -> Result<Transaction> {
        let amount = positive_amount(request.amount)?;
        let description = self.validate_description(&request.description)?;
        let sender_ref = self.accounts.find_by_iban(&Iban::new(&request.sender_iban))?;
        let receiver_ref = self
            .accounts
            .find_by_iban(&Iban::new(&request.receiver_iban))?;
        if sender_ref.id == receiver_ref.id {
            return Err(TransferError::Validation(
                "sender and receiver must be different accounts".to_owned(),
            ));
        }

        self.locks
            .with_exclusive(&[sender_ref.owner, receiver_ref.owner], || {
                tracing::debug!(
                    sender = %sender_ref.id,
                    receiver = %receiver_ref.id,
                    state = %RequestState::Validating,
                    "Validating transfer"
                );
                let sender = self.accounts.find_by_id(sender_ref.id)?;
                let receiver = self.accounts.find_by_id(receiver_ref.id)?;
                ensure_active(&sender)?;
                ensure_active(&receiver)?;
                if sender.currency != receiver.currency {
                    return Err(TransferError::Validation(format!(
                        "currency mismatch: {} vs {}",
                        sender.currency, receiver.currency
                    )));
                }
                self.authorize(initiated_by, Capability::Transfer, sender.owner)?;
                ensure_pairing(&sender, &receiver)?;
                self.check_debit_limits(sender.owner, amount)?;
                ensure_floor(&sender, amount)?;

                let sender_after = self.accounts.apply_balance_delta(sender.id, -amount)?;
                let receiver_after = match self.accounts.apply_balance_delta(receiver.id, amount) {
                    Ok(account) => account,
                    Err(err) => {
                        self.undo_delta(sender.id, amount);
                        return Err(err.into());
                    }
                };
                let entry = Transaction::transfer(
                    Party::from_account(&sender_after),
                    Party::from_account(&receiver_after),
                    amount,
                    sender_after.currency,
                    initiated_by,
                    description.clone(),
                );
                match self.ledger.append(entry) {
                    Ok(entry) => Ok(entry),
                    Err(err) => {
                        self.undo_delta(receiver.id, -amount);
                        self.undo_delta(sender.id, amount);
                        Err(err.into())
                    }
                }
            })
    }

    /// The user's spend against the daily cap, as of now.
    pub fn daily_allowance(&self, user: UserId, initiated_by: UserId) -> Result<DailyUsage> {
        self.authorize(initiated_by, Capability::ViewLimits, user)?;
        self.locks.with_exclusive(&[user], || {
            self.calculator.remaining(user, Utc::now()).map_err(Into::into)
        })
    }

    /// The user's configured limits.
    pub fn user_limits(&self, user: UserId, initiated_by: UserId) -> Result<UserLimits> {
        self.authorize(initiated_by, Capability::ViewLimits, user)?;
        self.limits.get(user).map_err(Into::into)
    }

    /// Change a user's limits.
    ///
    /// Serialized against in-flight debits for that user, so a cap
    /// change never interleaves with an allowance decision.
    pub fn update_user_limits(
        &self,
        user: UserId,
        update: LimitsUpdate,
        initiated_by: UserId,
    ) -> Result<UserLimits> {
        self.authorize(initiated_by, Capability::ManageLimits, user)?;
        self.locks.with_exclusive(&[user], || {
            let next = self.limits.update(user, update)?;
            tracing::info!(user = %user, "User limits updated");
            Ok(next)
        })
    }

    /// Search the ledger with caller-supplied filters.
    pub fn search_transactions(
        &self,
        query: &TransactionSearchQuery,
    ) -> Result<Vec<TransactionResponse>> {
        let (filter, page) = self.build_filter(query)?;
        let entries = self.ledger.search(&filter, page)?;
        Ok(entries
            .iter()
            .map(|entry| TransactionResponse::from_entry(entry, self.render(entry.initiated_by)))
            .collect())
    }

    fn render(&self, user: UserId) -> String {
        self.directory
            .username(user)
            .unwrap_or_else(|| user.to_string())
    }

    fn to_response(&self, entry: Transaction) -> TransactionResponse {
        let username = self.render(entry.initiated_by);
        TransactionResponse::from_entry(&entry, username)
    }

    fn build_filter(&self, query: &TransactionSearchQuery) -> Result<(TransactionFilter, Page)> {
        let kind = match &query.transaction_type {
            Some(raw) => Some(raw.parse::<TransactionKind>().map_err(|_| {
                TransferError::Validation(format!("unknown transaction type: {}", raw))
            })?),
            None => None,
        };
        let filter = TransactionFilter {
            amount_min: query.amount_min,
            amount_max: query.amount_max,
            from: query.from,
            to: query.to,
            sender_iban: query.sender_iban.as_ref().map(Iban::new),
            receiver_iban: query.receiver_iban.as_ref().map(Iban::new),
            sender_user: query.sender_user_id.map(UserId::from_uuid),
            receiver_user: query.receiver_user_id.map(UserId::from_uuid),
            kind,
            iban_prefix: query.iban.as_ref().map(|raw| Iban::new(raw).as_str().to_owned()),
        };

        let size = match query.page_size {
            Some(0) => {
                return Err(TransferError::Validation(
                    "page_size must be positive".to_owned(),
                ))
            }
            Some(requested) => requested.min(self.config.max_page_size),
            None => self.config.default_page_size,
        };
        let page = Page::new(query.page.unwrap_or(0) as usize, size as usize);
        Ok((filter, page))
    }

    fn authorize(
        &self,
        acting: UserId,
        capability: Capability,
        target_owner: UserId,
    ) -> Result<()> {
        if self.guard.check(acting, capability, target_owner).is_allowed() {
            Ok(())
        } else {
            Err(TransferError::Unauthorized(format!(
                "user {} may not {} for accounts of user {}",
                acting, capability, target_owner
            )))
        }
    }

    fn check_debit_limits(&self, owner: UserId, amount: Decimal) -> Result<()> {
        let limits = self.limits.get(owner)?;
        if amount > limits.transaction_limit {
            return Err(TransferError::TransactionLimitExceeded(format!(
                "amount {} exceeds transaction limit {}",
                amount, limits.transaction_limit
            )));
        }
        let usage = self.calculator.remaining(owner, Utc::now())?;
        if amount > usage.remaining {
            return Err(TransferError::DailyLimitExceeded(format!(
                "amount {} exceeds remaining daily allowance {}",
                amount, usage.remaining
            )));
        }
        Ok(())
    }

    fn validate_description(&self, description: &str) -> Result<String> {
        if description.chars().count() > self.config.max_description_length {
            return Err(TransferError::Validation(format!(
                "description exceeds {} characters",
                self.config.max_description_length
            )));
        }
        Ok(description.to_owned())
    }

    fn undo_delta(&self, account: AccountId, delta: Decimal) {
        if let Err(err) = self.accounts.apply_balance_delta(account, delta) {
            tracing::error!(
                account = %account,
                delta = %delta,
                error = %err,
                "Rollback failed, balance diverges from ledger"
            );
        }
    }

    fn observe(
        &self,
        operation: &'static str,
        committed: &prometheus::IntCounter,
        started: Instant,
        result: Result<Transaction>,
    ) -> Result<Transaction> {
        self.metrics
            .record_commit_duration(started.elapsed().as_secs_f64());
        match &result {
            Ok(entry) => {
                committed.inc();
                tracing::info!(
                    operation,
                    entry_id = %entry.id,
                    amount = %entry.amount,
                    state = %RequestState::Committed,
                    "Request committed"
                );
            }
            Err(err) if err.is_rejection() => {
                self.metrics.record_rejection();
                tracing::info!(
                    operation,
                    error = %err,
                    state = %RequestState::Rejected,
                    "Request rejected"
                );
            }
            Err(err) => {
                tracing::error!(operation, error = %err, "Request failed");
            }
        }
        result
    }
}

fn positive_amount(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(TransferError::Validation(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(amount)
}

fn ensure_active(account: &Account) -> Result<()> {
    if !account.active {
        return Err(TransferError::AccountInactive(account.iban.to_string()));
    }
    Ok(())
}

fn ensure_currency(account: &Account, requested: Currency) -> Result<()> {
    if account.currency != requested {
        return Err(TransferError::Validation(format!(
            "currency mismatch: account holds {}, request says {}",
            account.currency, requested
        )));
    }
    Ok(())
}

fn ensure_floor(account: &Account, amount: Decimal) -> Result<()> {
    if !account.can_debit(amount) {
        return Err(TransferError::InsufficientFunds(format!(
            "debiting {} would breach the balance floor {} (balance {})",
            amount, account.absolute_limit, account.balance
        )));
    }
    Ok(())
}

fn ensure_pairing(sender: &Account, receiver: &Account) -> Result<()> {
    let saving_involved =
        sender.kind == AccountType::Saving || receiver.kind == AccountType::Saving;
    if saving_involved && sender.owner != receiver.owner {
        return Err(TransferError::DisallowedAccountTypePairing(format!(
            "{} -> {}: saving accounts only transact with their owner's own accounts",
            sender.iban, receiver.iban
        )));
    }
    Ok(())
}
