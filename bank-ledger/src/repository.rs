//! Ledger persistence port and the in-memory reference implementation.

use crate::error::Result;
use crate::filter::{Page, TransactionFilter};
use crate::types::Transaction;
use account_core::UserId;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Storage port for ledger entries.
///
/// Entries are append-only; there is no update or delete. `search`
/// returns entries newest-first, ordered by timestamp and then by id
/// so that pagination is stable across calls.
pub trait TransactionRepository: Send + Sync {
    /// Persist a new entry.
    fn append(&self, tx: &Transaction) -> Result<()>;

    /// Fetch an entry by id.
    fn get(&self, id: Uuid) -> Result<Option<Transaction>>;

    /// Filtered, paginated search, newest entries first.
    fn search(&self, filter: &TransactionFilter, page: Page) -> Result<Vec<Transaction>>;

    /// Sum of all amounts debited from the user's accounts at or
    /// after `since`.
    fn sum_debits_since(&self, user: UserId, since: DateTime<Utc>) -> Result<Decimal>;
}

/// Sort newest-first: timestamp descending, id descending as the
/// tiebreak. Every repository implementation returns this order.
pub fn sort_newest_first(entries: &mut [Transaction]) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}

/// In-memory ledger repository for tests and the simulator.
#[derive(Default)]
pub struct MemoryTransactions {
    entries: RwLock<Vec<Transaction>>,
}

impl MemoryTransactions {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransactionRepository for MemoryTransactions {
    fn append(&self, tx: &Transaction) -> Result<()> {
        self.entries.write().push(tx.clone());
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<Transaction>> {
        Ok(self.entries.read().iter().find(|t| t.id == id).cloned())
    }

    fn search(&self, filter: &TransactionFilter, page: Page) -> Result<Vec<Transaction>> {
        let mut matches: Vec<Transaction> = self
            .entries
            .read()
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        sort_newest_first(&mut matches);
        Ok(matches
            .into_iter()
            .skip(page.offset())
            .take(page.size)
            .collect())
    }

    fn sum_debits_since(&self, user: UserId, since: DateTime<Utc>) -> Result<Decimal> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|t| t.debits(user) && t.timestamp >= since)
            .map(|t| t.amount)
            .sum())
    }
}
