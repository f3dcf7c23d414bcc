//! Recovery infrastructure for transaction-aware database recovery
//!
//! Replays apply commit decisions recorded in the WAL; they never re-run
//! ledger logic. Versions are preserved exactly.
//!
//! ## Recovery Procedure
//!
//! 1. Open WAL with the configured durability mode
//! 2. Decode entries, truncating a torn tail
//! 3. Apply transactions that have a CommitTxn marker, in log order
//! 4. Discard incomplete and aborted transactions
//! 5. Initialize TransactionManager with the final version and max txn id

use crate::TransactionManager;
use std::path::PathBuf;
use tally_core::error::Result;
use tally_durability::recovery::replay_wal;
use tally_durability::wal::{DurabilityMode, WAL};
use tally_storage::UnifiedStore;
use tracing::info;

/// Coordinates database recovery after crash or restart
pub struct RecoveryCoordinator {
    wal_path: PathBuf,
    durability_mode: DurabilityMode,
}

impl RecoveryCoordinator {
    /// Create a new recovery coordinator for the WAL at `wal_path`
    pub fn new(wal_path: PathBuf) -> Self {
        RecoveryCoordinator {
            wal_path,
            durability_mode: DurabilityMode::default(),
        }
    }

    /// Durability mode the recovered WAL is reopened with
    pub fn with_durability_mode(mut self, mode: DurabilityMode) -> Self {
        self.durability_mode = mode;
        self
    }

    /// Perform recovery and return initialized components
    ///
    /// # Recovery Guarantees
    ///
    /// - **Deterministic**: Given the same WAL, replay always produces identical state
    /// - **Version preservation**: Replay preserves exact version numbers from WAL
    /// - **Incomplete = discarded**: Transactions without CommitTxn are discarded
    pub fn recover(&self) -> Result<RecoveryResult> {
        let mut wal = WAL::open(&self.wal_path, self.durability_mode)?;
        let storage = UnifiedStore::new();

        let replay = replay_wal(&mut wal, &storage)?;

        let txn_manager = TransactionManager::with_txn_id(replay.final_version, replay.max_txn_id);

        let stats = RecoveryStats {
            txns_replayed: replay.txns_applied,
            incomplete_txns: replay.incomplete_txns,
            aborted_txns: replay.aborted_txns,
            orphaned_entries: replay.orphaned_entries,
            writes_applied: replay.writes_applied,
            final_version: replay.final_version,
            truncated_bytes: replay.truncated_bytes,
        };

        info!(
            target: "tally::recovery",
            path = %self.wal_path.display(),
            txns = stats.txns_replayed,
            records = storage.len(),
            version = stats.final_version,
            "Recovery complete"
        );

        Ok(RecoveryResult {
            storage,
            txn_manager,
            wal,
            stats,
        })
    }
}

/// Result of recovery operation
pub struct RecoveryResult {
    /// Recovered storage with all committed transactions applied
    pub storage: UnifiedStore,
    /// Transaction manager initialized with recovered version and txn id
    pub txn_manager: TransactionManager,
    /// The WAL, truncated to its valid prefix and ready for appends
    pub wal: WAL,
    /// Statistics about the recovery process
    pub stats: RecoveryStats,
}

/// Statistics from recovery
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Number of committed transactions replayed
    pub txns_replayed: usize,
    /// Number of incomplete transactions discarded
    pub incomplete_txns: usize,
    /// Number of aborted transactions discarded
    pub aborted_txns: usize,
    /// Entries that belonged to no open transaction
    pub orphaned_entries: usize,
    /// Number of write operations applied
    pub writes_applied: usize,
    /// Final version after recovery
    pub final_version: u64,
    /// Bytes cut from a torn WAL tail
    pub truncated_bytes: u64,
}

impl RecoveryStats {
    /// Total transactions found (replayed + incomplete + aborted)
    pub fn total_transactions(&self) -> usize {
        self.txns_replayed + self.incomplete_txns + self.aborted_txns
    }
}
