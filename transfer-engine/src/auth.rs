//! Role-based authorization.
//!
//! The decision logic is a pure function over (role, initiator,
//! capability, target owner); [`RoleGuard`] is the default directory
//! of role assignments backing it.

use account_core::UserId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Coarse-grained user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// May operate on own accounts only.
    Customer,
    /// May operate on any account and manage limits.
    Employee,
}

/// Operation classes the guard distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Credit cash into an account.
    Deposit,
    /// Debit cash out of an account.
    Withdraw,
    /// Move funds between two accounts.
    Transfer,
    /// Change a user's limit configuration.
    ManageLimits,
    /// Read a user's limit configuration and daily allowance.
    ViewLimits,
}

impl Capability {
    /// Stable name used in log fields and denial messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Deposit => "deposit",
            Capability::Withdraw => "withdraw",
            Capability::Transfer => "transfer",
            Capability::ManageLimits => "manage_limits",
            Capability::ViewLimits => "view_limits",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The initiator may proceed.
    Allow,
    /// The initiator must not proceed.
    Deny,
}

impl AccessDecision {
    /// Whether the decision permits the operation.
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// Pure decision function.
///
/// Employees may do everything. Customers may never manage limits,
/// and may only act on accounts they own.
pub fn is_permitted(
    role: Role,
    acting: UserId,
    capability: Capability,
    target_owner: UserId,
) -> AccessDecision {
    match role {
        Role::Employee => AccessDecision::Allow,
        Role::Customer => match capability {
            Capability::ManageLimits => AccessDecision::Deny,
            Capability::Deposit
            | Capability::Withdraw
            | Capability::Transfer
            | Capability::ViewLimits => {
                if acting == target_owner {
                    AccessDecision::Allow
                } else {
                    AccessDecision::Deny
                }
            }
        },
    }
}

/// Source of authorization decisions for the engine.
pub trait AuthorizationGuard: Send + Sync {
    /// Decide whether `acting` may exercise `capability` against an
    /// account owned by `target_owner`.
    fn check(
        &self,
        acting: UserId,
        capability: Capability,
        target_owner: UserId,
    ) -> AccessDecision;
}

/// Role registry with an in-memory assignment table.
///
/// Users without an explicit assignment are treated as customers.
#[derive(Debug, Default)]
pub struct RoleGuard {
    roles: DashMap<UserId, Role>,
}

impl RoleGuard {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns or replaces a user's role.
    pub fn assign(&self, user: UserId, role: Role) {
        self.roles.insert(user, role);
    }

    /// Returns the effective role for a user.
    pub fn role_of(&self, user: UserId) -> Role {
        self.roles
            .get(&user)
            .map(|entry| *entry.value())
            .unwrap_or(Role::Customer)
    }
}

impl AuthorizationGuard for RoleGuard {
    fn check(
        &self,
        acting: UserId,
        capability: Capability,
        target_owner: UserId,
    ) -> AccessDecision {
        is_permitted(self.role_of(acting), acting, capability, target_owner)
    }
}
