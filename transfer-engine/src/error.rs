//! Error taxonomy for the transfer engine.
//!
//! Callers branch on two things: the specific rejection reason and
//! whether the failure was a business rejection at all. Rejections
//! mean the request was understood and refused; [`TransferError::Internal`]
//! and [`TransferError::Config`] mean the engine itself faulted.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, TransferError>;

/// Errors surfaced by the transfer engine.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The request is malformed: bad amount, bad currency, overlong
    /// description, unknown filter value.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No account matches the given IBAN or id.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// The account is frozen for balance-affecting operations.
    #[error("Account is inactive: {0}")]
    AccountInactive(String),

    /// The debit would take the balance below the account floor.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// The amount exceeds the per-transaction limit.
    #[error("Transaction limit exceeded: {0}")]
    TransactionLimitExceeded(String),

    /// The amount exceeds what is left of the daily debit cap.
    #[error("Daily limit exceeded: {0}")]
    DailyLimitExceeded(String),

    /// A SAVING account was paired with an account outside its
    /// owner's CURRENT/SAVING pair.
    #[error("Disallowed account type pairing: {0}")]
    DisallowedAccountTypePairing(String),

    /// The initiator lacks the right to perform this operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An account with this IBAN already exists.
    #[error("IBAN already registered: {0}")]
    DuplicateIban(String),

    /// The operation would break an account product rule.
    #[error("Account rule violation: {0}")]
    AccountRuleViolation(String),

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The engine or a backing store faulted.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransferError {
    /// Whether this is a business rejection rather than a fault.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, TransferError::Internal(_) | TransferError::Config(_))
    }
}

impl From<account_core::Error> for TransferError {
    fn from(err: account_core::Error) -> Self {
        match err {
            account_core::Error::NotFound(s) => TransferError::AccountNotFound(s),
            account_core::Error::Inactive(s) => TransferError::AccountInactive(s),
            account_core::Error::DuplicateIban(s) => TransferError::DuplicateIban(s),
            account_core::Error::InvalidIban(s) => {
                TransferError::Validation(format!("invalid IBAN: {}", s))
            }
            account_core::Error::RuleViolation(s) => TransferError::AccountRuleViolation(s),
            account_core::Error::InvariantViolation(s) => TransferError::InsufficientFunds(s),
            account_core::Error::Storage(s) => TransferError::Internal(s),
        }
    }
}

impl From<bank_ledger::Error> for TransferError {
    fn from(err: bank_ledger::Error) -> Self {
        // The engine composes ledger entries itself; any entry the
        // ledger refuses is an engine bug, not a caller error.
        TransferError::Internal(err.to_string())
    }
}

impl From<limits_engine::Error> for TransferError {
    fn from(err: limits_engine::Error) -> Self {
        match err {
            limits_engine::Error::InvalidLimits(s) => TransferError::Validation(s),
            limits_engine::Error::NotConfigured(s) => {
                TransferError::Internal(format!("no limits configured for user {}", s))
            }
            limits_engine::Error::Ledger(s) => TransferError::Internal(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_exclude_faults() {
        assert!(TransferError::InsufficientFunds("x".into()).is_rejection());
        assert!(TransferError::DailyLimitExceeded("x".into()).is_rejection());
        assert!(TransferError::Unauthorized("x".into()).is_rejection());
        assert!(!TransferError::Internal("x".into()).is_rejection());
        assert!(!TransferError::Config("x".into()).is_rejection());
    }

    #[test]
    fn account_errors_map_to_engine_taxonomy() {
        let err: TransferError = account_core::Error::NotFound("NL91".into()).into();
        assert!(matches!(err, TransferError::AccountNotFound(_)));

        let err: TransferError = account_core::Error::InvariantViolation("floor".into()).into();
        assert!(matches!(err, TransferError::InsufficientFunds(_)));

        let err: TransferError = account_core::Error::Storage("disk".into()).into();
        assert!(matches!(err, TransferError::Internal(_)));
    }

    #[test]
    fn limits_errors_split_by_origin() {
        let err: TransferError = limits_engine::Error::InvalidLimits("neg".into()).into();
        assert!(matches!(err, TransferError::Validation(_)));

        let err: TransferError = limits_engine::Error::NotConfigured("u".into()).into();
        assert!(matches!(err, TransferError::Internal(_)));
    }
}
