//! Per-owner exclusive sections.
//!
//! Balance checks and the writes they justify must happen without
//! interleaving from other requests touching the same owners. Locks
//! are keyed by owner, not account, so a user's CURRENT and SAVING
//! accounts and their daily debit total are all covered by one cell.

use std::sync::Arc;

use account_core::UserId;
use dashmap::DashMap;
use parking_lot::Mutex;

/// Registry of per-owner mutexes.
///
/// Lock cells are created on first use and never removed. Guards are
/// always acquired in ascending `UserId` order so two requests over
/// the same owner pair cannot deadlock. Exclusive sections must not
/// nest.
#[derive(Debug, Default)]
pub struct OwnerLocks {
    cells: DashMap<UserId, Arc<Mutex<()>>>,
}

impl OwnerLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the locks of every owner in `owners`.
    ///
    /// Duplicate owners are collapsed, so a self-transfer locks its
    /// owner once.
    pub fn with_exclusive<T>(&self, owners: &[UserId], f: impl FnOnce() -> T) -> T {
        let mut ordered: Vec<UserId> = owners.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let cells: Vec<Arc<Mutex<()>>> = ordered
            .iter()
            .map(|owner| self.cells.entry(*owner).or_default().value().clone())
            .collect();
        let _guards: Vec<_> = cells.iter().map(|cell| cell.lock()).collect();
        f()
    }
}
