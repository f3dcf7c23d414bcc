//! Transaction manager for coordinating commit operations
//!
//! Provides atomic commit by orchestrating:
//! 1. WAL writing (durability)
//! 2. Storage application (visibility)
//!
//! Writers are serialized by the commit lock. The engine takes the lock
//! before running a transaction body and releases it after commit, so every
//! read-modify-write sees the result of the one before it.
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. commit_version = current version + 1
//! 2. BeginTxn to WAL
//! 3. Write entries with commit_version
//! 4. CommitTxn to WAL (DURABILITY POINT)
//! 5. Publish commit_version
//! 6. apply_writes() to storage as one batch
//! 7. mark_committed()
//! ```
//!
//! A crash before step 4 leaves an incomplete group that recovery discards.
//! A crash after step 4 is replayed on recovery. An error returned from
//! steps 2-4 truncates the log back to where step 2 started.

use crate::wal_writer::TransactionWALWriter;
use crate::TransactionContext;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tally_core::error::{Error, Result};
use tally_core::{Storage, Timestamp};
use tally_durability::wal::WAL;
use tracing::{debug, error, warn};

/// Manages transaction lifecycle and atomic commits
///
/// The global version counter is incremented once per committed
/// transaction; all keys in a transaction get the same commit version.
#[derive(Debug)]
pub struct TransactionManager {
    /// Global version counter
    version: AtomicU64,

    /// Next transaction ID
    next_txn_id: AtomicU64,

    /// Held for the whole body and commit of a write transaction
    commit_lock: Mutex<()>,

    /// Set when a failed commit could not be rolled back out of the WAL
    wal_failed: AtomicBool,
}

impl TransactionManager {
    /// Create a new transaction manager
    pub fn new(initial_version: u64) -> Self {
        Self::with_txn_id(initial_version, 0)
    }

    /// Create a new transaction manager with specific starting txn_id
    ///
    /// Used after recovery so new transactions never reuse an id that is
    /// already in the WAL.
    pub fn with_txn_id(initial_version: u64, max_txn_id: u64) -> Self {
        TransactionManager {
            version: AtomicU64::new(initial_version),
            next_txn_id: AtomicU64::new(max_txn_id + 1),
            commit_lock: Mutex::new(()),
            wal_failed: AtomicBool::new(false),
        }
    }

    /// Get current global version
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Take the commit lock
    ///
    /// Callers must hold the returned guard from the first read of a
    /// write transaction until `commit` returns.
    pub fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.commit_lock.lock()
    }

    /// Commit a transaction atomically
    ///
    /// The caller must hold the guard from [`lock_writes`](Self::lock_writes).
    ///
    /// A transaction with no writes commits without touching the WAL or
    /// storage and returns the current version.
    ///
    /// On a WAL failure the log is rolled back to where the transaction
    /// began, the version counter is left unchanged and the error is
    /// returned. Nothing of a failed commit survives a restart, even when
    /// the failure came after the commit marker was written. If the rollback
    /// itself fails the manager refuses every later commit.
    pub fn commit(
        &self,
        txn: &mut TransactionContext,
        store: &dyn Storage,
        wal: Option<&mut WAL>,
        timestamp: Timestamp,
    ) -> Result<u64> {
        self.commit_with(txn, store, wal, timestamp, Self::write_wal)
    }

    fn commit_with<W>(
        &self,
        txn: &mut TransactionContext,
        store: &dyn Storage,
        wal: Option<&mut WAL>,
        timestamp: Timestamp,
        write_wal: W,
    ) -> Result<u64>
    where
        W: FnOnce(&TransactionContext, &mut WAL, u64, Timestamp) -> Result<()>,
    {
        if self.wal_failed.load(Ordering::SeqCst) {
            return Err(Error::StorageError(
                "WAL is in an unknown state after a failed rollback; reopen the database"
                    .to_string(),
            ));
        }
        txn.ensure_active()?;

        if txn.write_count() == 0 {
            txn.mark_committed()?;
            return Ok(self.current_version());
        }

        let commit_version = self.current_version() + 1;

        if let Some(wal) = wal {
            let start = wal.size();
            if let Err(e) = write_wal(&*txn, &mut *wal, commit_version, timestamp) {
                warn!(target: "tally::txn", txn_id = txn.txn_id, error = %e, "WAL write failed, rolling back");
                let _ = txn.mark_aborted(format!("WAL write failed: {}", e));
                if let Err(rollback) = wal.rollback_to(start) {
                    self.wal_failed.store(true, Ordering::SeqCst);
                    error!(
                        target: "tally::txn",
                        txn_id = txn.txn_id,
                        error = %rollback,
                        "WAL rollback failed, refusing further commits"
                    );
                    return Err(rollback);
                }
                return Err(e);
            }
        }

        self.version.fetch_max(commit_version, Ordering::SeqCst);

        let applied = match txn.apply_writes(store, commit_version) {
            Ok(n) => n,
            Err(e) => {
                let _ = txn.mark_aborted(format!("apply failed: {}", e));
                return Err(e);
            }
        };
        txn.mark_committed()?;

        debug!(
            target: "tally::txn",
            txn_id = txn.txn_id,
            version = commit_version,
            writes = applied,
            "Transaction committed"
        );

        Ok(commit_version)
    }

    fn write_wal(
        txn: &TransactionContext,
        wal: &mut WAL,
        version: u64,
        timestamp: Timestamp,
    ) -> Result<()> {
        let mut writer = TransactionWALWriter::new(wal, txn.txn_id);
        writer.write_begin(timestamp)?;
        txn.write_to_wal(&mut writer, version)?;
        writer.write_commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tally_core::{EntityKind, Key};
    use tally_durability::recovery::replay_wal;
    use tally_durability::wal::{DurabilityMode, WALEntry};
    use tally_storage::UnifiedStore;
    use tempfile::TempDir;

    #[test]
    fn test_version_and_txn_id_allocation() {
        let manager = TransactionManager::with_txn_id(10, 4);
        assert_eq!(manager.current_version(), 10);
        assert_eq!(manager.next_txn_id(), 5);
        assert_eq!(manager.next_txn_id(), 6);
    }

    #[test]
    fn test_commit_writes_wal_then_storage() {
        let dir = TempDir::new().unwrap();
        let mut wal = WAL::open(dir.path().join("t.wal"), DurabilityMode::Strict).unwrap();
        let store = Arc::new(UnifiedStore::new());
        let manager = TransactionManager::new(0);

        let _guard = manager.lock_writes();
        let mut txn = TransactionContext::new(manager.next_txn_id(), store.clone());
        txn.put(Key::new(EntityKind::User, "a"), vec![1]).unwrap();
        txn.put(Key::new(EntityKind::Prize, "p"), vec![2]).unwrap();

        let version = manager
            .commit(&mut txn, store.as_ref(), Some(&mut wal), Timestamp::from_secs(1))
            .unwrap();

        assert_eq!(version, 1);
        assert!(txn.is_committed());
        assert_eq!(store.current_version(), 1);
        assert_eq!(store.len(), 2);

        let entries = wal.read_all().unwrap();
        assert_eq!(entries.len(), 4);
        assert!(matches!(entries[0], WALEntry::BeginTxn { txn_id: 1, .. }));
        assert_eq!(entries[3], WALEntry::CommitTxn { txn_id: 1 });
    }

    fn put_user(
        manager: &TransactionManager,
        store: &Arc<UnifiedStore>,
        id: &str,
    ) -> TransactionContext {
        let mut txn = TransactionContext::new(manager.next_txn_id(), store.clone());
        txn.put(Key::new(EntityKind::User, id), id.as_bytes().to_vec())
            .unwrap();
        txn
    }

    #[test]
    fn test_failure_after_commit_marker_is_not_replayed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.wal");
        let store = Arc::new(UnifiedStore::new());
        let manager = TransactionManager::new(0);

        {
            let mut wal = WAL::open(&path, DurabilityMode::Strict).unwrap();

            let mut txn = put_user(&manager, &store, "kept");
            manager
                .commit(&mut txn, store.as_ref(), Some(&mut wal), Timestamp::EPOCH)
                .unwrap();
            let committed_len = wal.size();

            // Whole group written, then the fsync reports an error
            let mut txn = put_user(&manager, &store, "failed");
            let result = manager.commit_with(
                &mut txn,
                store.as_ref(),
                Some(&mut wal),
                Timestamp::EPOCH,
                |txn, wal, version, ts| {
                    TransactionManager::write_wal(txn, wal, version, ts)?;
                    Err(Error::StorageError("Failed to fsync: injected".to_string()))
                },
            );

            assert!(result.is_err());
            assert!(txn.is_aborted());
            assert_eq!(manager.current_version(), 1);
            assert_eq!(store.count(EntityKind::User), 1);
            assert_eq!(wal.size(), committed_len);

            // The next commit takes the version the failed one would have had
            let mut txn = put_user(&manager, &store, "after");
            let version = manager
                .commit(&mut txn, store.as_ref(), Some(&mut wal), Timestamp::EPOCH)
                .unwrap();
            assert_eq!(version, 2);
        }

        let mut wal = WAL::open(&path, DurabilityMode::Strict).unwrap();
        let recovered = UnifiedStore::new();
        let stats = replay_wal(&mut wal, &recovered).unwrap();

        assert_eq!(stats.txns_applied, 2);
        assert_eq!(stats.orphaned_entries, 0);
        assert_eq!(stats.truncated_bytes, 0);
        assert_eq!(stats.final_version, 2);
        assert!(recovered.get(&Key::new(EntityKind::User, "kept")).unwrap().is_some());
        assert!(recovered.get(&Key::new(EntityKind::User, "after")).unwrap().is_some());
        assert!(recovered.get(&Key::new(EntityKind::User, "failed")).unwrap().is_none());
    }

    #[test]
    fn test_failure_mid_group_leaves_no_partial_entries() {
        let dir = TempDir::new().unwrap();
        let mode = DurabilityMode::Batched {
            interval_ms: 60_000,
            batch_size: 1_000,
        };
        let mut wal = WAL::open(dir.path().join("t.wal"), mode).unwrap();
        let store = Arc::new(UnifiedStore::new());
        let manager = TransactionManager::new(0);

        let mut txn = put_user(&manager, &store, "half");
        let result = manager.commit_with(
            &mut txn,
            store.as_ref(),
            Some(&mut wal),
            Timestamp::EPOCH,
            |txn, wal, version, ts| {
                let mut writer = TransactionWALWriter::new(wal, txn.txn_id);
                writer.write_begin(ts)?;
                txn.write_to_wal(&mut writer, version)?;
                Err(Error::StorageError("disk full".to_string()))
            },
        );
        assert!(result.is_err());
        assert_eq!(manager.current_version(), 0);

        let mut txn = put_user(&manager, &store, "whole");
        manager
            .commit(&mut txn, store.as_ref(), Some(&mut wal), Timestamp::EPOCH)
            .unwrap();

        let entries = wal.read_all().unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.txn_id() == txn.txn_id));
    }

    #[test]
    fn test_empty_commit_skips_wal() {
        let dir = TempDir::new().unwrap();
        let mut wal = WAL::open(dir.path().join("t.wal"), DurabilityMode::Strict).unwrap();
        let store = Arc::new(UnifiedStore::new());
        let manager = TransactionManager::new(3);

        let mut txn = TransactionContext::new(manager.next_txn_id(), store.clone());
        let version = manager
            .commit(&mut txn, store.as_ref(), Some(&mut wal), Timestamp::EPOCH)
            .unwrap();

        assert_eq!(version, 3);
        assert!(txn.is_committed());
        assert_eq!(wal.size(), 0);
    }

    #[test]
    fn test_commit_without_wal() {
        let store = Arc::new(UnifiedStore::new());
        let manager = TransactionManager::new(0);
        let mut txn = TransactionContext::new(manager.next_txn_id(), store.clone());
        txn.put(Key::new(EntityKind::Token, "t"), vec![]).unwrap();

        manager
            .commit(&mut txn, store.as_ref(), None, Timestamp::EPOCH)
            .unwrap();
        assert_eq!(store.count(EntityKind::Token), 1);
    }

    #[test]
    fn test_commit_rejects_inactive_transaction() {
        let store = Arc::new(UnifiedStore::new());
        let manager = TransactionManager::new(0);
        let mut txn = TransactionContext::new(1, store.clone());
        txn.mark_aborted("test").unwrap();
        assert!(manager
            .commit(&mut txn, store.as_ref(), None, Timestamp::EPOCH)
            .is_err());
    }

    #[test]
    fn test_commit_lock_serializes_read_modify_write() {
        let store = Arc::new(UnifiedStore::new());
        let manager = Arc::new(TransactionManager::new(0));
        let key = Key::new(EntityKind::User, "counter");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let manager = Arc::clone(&manager);
                let key = key.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        let _guard = manager.lock_writes();
                        let mut txn =
                            TransactionContext::new(manager.next_txn_id(), store.clone());
                        let current = txn
                            .get(&key)
                            .unwrap()
                            .map(|v| u64::from_le_bytes(v.try_into().unwrap()))
                            .unwrap_or(0);
                        txn.put(key.clone(), (current + 1).to_le_bytes().to_vec())
                            .unwrap();
                        manager
                            .commit(&mut txn, store.as_ref(), None, Timestamp::EPOCH)
                            .unwrap();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let stored = store.get(&key).unwrap().unwrap();
        assert_eq!(u64::from_le_bytes(stored.value.try_into().unwrap()), 200);
        assert_eq!(manager.current_version(), 200);
    }
}
