//! Transaction coordinator for managing transaction lifecycle
//!
//! The TransactionCoordinator wraps TransactionManager and adds:
//! - Active transaction tracking
//! - Transaction metrics (started, committed, aborted)
//! - Commit rate calculation

use parking_lot::MutexGuard;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tally_concurrency::{TransactionContext, TransactionManager};
use tally_core::error::Result;
use tally_core::{Storage, Timestamp};
use tally_durability::wal::WAL;
use tracing::{debug, warn};

/// Transaction coordinator for the database
///
/// Manages transaction lifecycle, ID allocation, version tracking, and metrics.
///
/// # Memory Ordering
///
/// The metric counters use Relaxed ordering. They are observational only
/// and do not synchronize any other memory operations.
#[derive(Debug)]
pub struct TransactionCoordinator {
    manager: TransactionManager,
    active_count: AtomicU64,
    total_started: AtomicU64,
    total_committed: AtomicU64,
    total_aborted: AtomicU64,
}

impl TransactionCoordinator {
    /// Create new coordinator with initial version
    pub fn new(initial_version: u64) -> Self {
        Self::from_manager(TransactionManager::new(initial_version))
    }

    /// Create coordinator around a recovered manager
    ///
    /// The manager already carries the recovered version and max txn id.
    pub fn from_manager(manager: TransactionManager) -> Self {
        Self {
            manager,
            active_count: AtomicU64::new(0),
            total_started: AtomicU64::new(0),
            total_committed: AtomicU64::new(0),
            total_aborted: AtomicU64::new(0),
        }
    }

    /// Take the global write lock
    pub fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.manager.lock_writes()
    }

    /// Start a new read-write transaction over `storage`
    pub fn start_transaction(&self, storage: Arc<dyn Storage>) -> TransactionContext {
        let txn_id = self.manager.next_txn_id();
        self.record_start();

        debug!(target: "tally::txn", txn_id, "Transaction started");

        TransactionContext::new(txn_id, storage)
    }

    /// Commit a transaction through the concurrency layer
    ///
    /// Records commit/abort metrics around `TransactionManager::commit`.
    /// Pass `None` for `wal` on ephemeral databases.
    pub fn commit(
        &self,
        txn: &mut TransactionContext,
        store: &dyn Storage,
        wal: Option<&mut WAL>,
        timestamp: Timestamp,
    ) -> Result<u64> {
        match self.manager.commit(txn, store, wal, timestamp) {
            Ok(version) => {
                self.record_commit();
                Ok(version)
            }
            Err(e) => {
                self.record_abort();
                warn!(target: "tally::txn", txn_id = txn.txn_id, error = %e, "Transaction aborted");
                Err(e)
            }
        }
    }

    /// Abort a transaction whose body returned an error
    pub fn abort(&self, txn: &mut TransactionContext, reason: &str) {
        let _ = txn.mark_aborted(reason);
        self.record_abort();
        debug!(target: "tally::txn", txn_id = txn.txn_id, reason, "Transaction aborted");
    }

    fn record_start(&self) {
        self.active_count.fetch_add(1, Ordering::Relaxed);
        self.total_started.fetch_add(1, Ordering::Relaxed);
    }

    fn record_commit(&self) {
        let _ = self
            .active_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |x| {
                Some(x.saturating_sub(1))
            });
        self.total_committed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_abort(&self) {
        let _ = self
            .active_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |x| {
                Some(x.saturating_sub(1))
            });
        self.total_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current global version
    pub fn current_version(&self) -> u64 {
        self.manager.current_version()
    }

    /// Get next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.manager.next_txn_id()
    }

    /// Get transaction metrics
    pub fn metrics(&self) -> TransactionMetrics {
        let started = self.total_started.load(Ordering::Relaxed);
        let committed = self.total_committed.load(Ordering::Relaxed);

        TransactionMetrics {
            active_count: self.active_count.load(Ordering::Relaxed),
            total_started: started,
            total_committed: committed,
            total_aborted: self.total_aborted.load(Ordering::Relaxed),
            commit_rate: if started > 0 {
                committed as f64 / started as f64
            } else {
                0.0
            },
        }
    }
}

/// Transaction metrics
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionMetrics {
    /// Number of currently active transactions
    pub active_count: u64,
    /// Total number of transactions started
    pub total_started: u64,
    /// Total number of transactions committed
    pub total_committed: u64,
    /// Total number of transactions aborted
    pub total_aborted: u64,
    /// Commit success rate (committed / started)
    pub commit_rate: f64,
}

impl TransactionMetrics {
    /// Total transactions that completed (committed + aborted)
    pub fn total_completed(&self) -> u64 {
        self.total_committed + self.total_aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{EntityKind, Key};
    use tally_storage::UnifiedStore;

    #[test]
    fn test_coordinator_new() {
        let coordinator = TransactionCoordinator::new(0);
        assert_eq!(coordinator.current_version(), 0);

        let metrics = coordinator.metrics();
        assert_eq!(metrics.active_count, 0);
        assert_eq!(metrics.total_started, 0);
        assert_eq!(metrics.commit_rate, 0.0);
    }

    #[test]
    fn test_metrics_track_commit_and_abort() {
        let coordinator = TransactionCoordinator::new(0);
        let store = Arc::new(UnifiedStore::new());

        let mut txn = coordinator.start_transaction(store.clone());
        txn.put(Key::new(EntityKind::User, "a"), vec![1]).unwrap();
        assert_eq!(coordinator.metrics().active_count, 1);
        coordinator
            .commit(&mut txn, store.as_ref(), None, Timestamp::EPOCH)
            .unwrap();

        let mut txn = coordinator.start_transaction(store.clone());
        coordinator.abort(&mut txn, "closure failed");
        assert!(txn.is_aborted());

        let metrics = coordinator.metrics();
        assert_eq!(metrics.active_count, 0);
        assert_eq!(metrics.total_started, 2);
        assert_eq!(metrics.total_committed, 1);
        assert_eq!(metrics.total_aborted, 1);
        assert_eq!(metrics.total_completed(), 2);
        assert_eq!(metrics.commit_rate, 0.5);
        assert_eq!(coordinator.current_version(), 1);
    }

    #[test]
    fn test_txn_ids_are_unique() {
        let coordinator = TransactionCoordinator::from_manager(TransactionManager::with_txn_id(0, 10));
        let store = Arc::new(UnifiedStore::new());
        let a = coordinator.start_transaction(store.clone());
        let b = coordinator.start_transaction(store);
        assert_eq!(a.txn_id, 11);
        assert_eq!(b.txn_id, 12);
    }
}
