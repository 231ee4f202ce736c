//! User identity resolution port.

use crate::types::UserId;
use dashmap::DashMap;

/// Resolves user ids to display names for receipts and statements.
///
/// Identity management lives outside the transaction engine; this
/// port is the one slice of it the engine needs.
pub trait UserDirectory: Send + Sync {
    /// The username for a user id, if known.
    fn username(&self, user: UserId) -> Option<String>;
}

/// In-memory directory for tests and the simulator.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: DashMap<UserId, String>,
}

impl MemoryUserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a username.
    pub fn register(&self, user: UserId, username: impl Into<String>) {
        self.users.insert(user, username.into());
    }
}

impl UserDirectory for MemoryUserDirectory {
    fn username(&self, user: UserId) -> Option<String> {
        self.users.get(&user).map(|entry| entry.value().clone())
    }
}
