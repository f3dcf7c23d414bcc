//! WAL Replay Logic for Recovery
//!
//! Restores storage state from the write-ahead log. Only transactions whose
//! `CommitTxn` marker reached the log are applied.
//!
//! ## Replay Process
//!
//! 1. Decode WAL entries from the beginning, stopping at the first bad entry
//! 2. Truncate the file to its valid prefix so later appends follow valid data
//! 3. Collect writes per txn_id between `BeginTxn` and `CommitTxn`
//! 4. Apply each committed transaction as one batch, in commit order
//! 5. Discard aborted transactions, transactions with no commit marker, and
//!    writes that appear outside any transaction
//!
//! Replay reuses the commit versions recorded in the log so the rebuilt
//! store is identical to the one that was running before the crash.

use crate::wal::{WALEntry, WAL};
use std::collections::HashMap;
use tally_core::error::Result;
use tally_core::{Key, Storage};
use tracing::{debug, warn};

/// Statistics from WAL replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// Number of committed transactions that were applied
    pub txns_applied: usize,
    /// Number of Write operations applied
    pub writes_applied: usize,
    /// Number of incomplete transactions discarded (no CommitTxn)
    pub incomplete_txns: usize,
    /// Number of aborted transactions discarded
    pub aborted_txns: usize,
    /// Number of orphaned entries discarded (no matching BeginTxn)
    pub orphaned_entries: usize,
    /// Highest commit version seen in applied transactions
    pub final_version: u64,
    /// Highest transaction id seen anywhere in the log
    pub max_txn_id: u64,
    /// Bytes cut from the end of the file because they did not decode
    pub truncated_bytes: u64,
}

#[derive(Default)]
struct PendingTxn {
    writes: Vec<(Key, Vec<u8>)>,
    version: u64,
}

/// Apply committed transactions from a sequence of entries
pub fn replay_entries(entries: &[WALEntry], storage: &dyn Storage) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();
    let mut open: HashMap<u64, PendingTxn> = HashMap::new();

    for entry in entries {
        let txn_id = entry.txn_id();
        stats.max_txn_id = stats.max_txn_id.max(txn_id);

        match entry {
            WALEntry::BeginTxn { .. } => {
                if open.insert(txn_id, PendingTxn::default()).is_some() {
                    warn!(target: "tally::recovery", txn_id, "Duplicate BeginTxn, dropping earlier writes");
                    stats.incomplete_txns += 1;
                }
            }
            WALEntry::Write {
                key,
                value,
                version,
                ..
            } => match open.get_mut(&txn_id) {
                Some(pending) => {
                    pending.writes.push((key.clone(), value.clone()));
                    pending.version = pending.version.max(*version);
                }
                None => stats.orphaned_entries += 1,
            },
            WALEntry::CommitTxn { .. } => match open.remove(&txn_id) {
                Some(pending) => {
                    if !pending.writes.is_empty() {
                        storage.apply_batch(&pending.writes, pending.version)?;
                    }
                    stats.txns_applied += 1;
                    stats.writes_applied += pending.writes.len();
                    stats.final_version = stats.final_version.max(pending.version);
                }
                None => stats.orphaned_entries += 1,
            },
            WALEntry::AbortTxn { .. } => {
                if open.remove(&txn_id).is_some() {
                    stats.aborted_txns += 1;
                } else {
                    stats.orphaned_entries += 1;
                }
            }
        }
    }

    stats.incomplete_txns += open.len();

    if stats.incomplete_txns > 0 || stats.orphaned_entries > 0 {
        warn!(
            target: "tally::recovery",
            incomplete = stats.incomplete_txns,
            orphaned = stats.orphaned_entries,
            "Discarded uncommitted WAL data"
        );
    }

    Ok(stats)
}

/// Replay a WAL into storage, truncating any torn tail first
pub fn replay_wal(wal: &mut WAL, storage: &dyn Storage) -> Result<ReplayStats> {
    let scan = wal.scan()?;

    let truncated_bytes = if scan.has_invalid_tail() {
        let cut = scan.file_len - scan.valid_len;
        warn!(
            target: "tally::recovery",
            path = %wal.path().display(),
            valid_len = scan.valid_len,
            cut,
            reason = scan.stop_reason.as_deref().unwrap_or("unknown"),
            "Truncating invalid WAL tail"
        );
        wal.truncate(scan.valid_len)?;
        cut
    } else {
        0
    };

    let mut stats = replay_entries(&scan.entries, storage)?;
    stats.truncated_bytes = truncated_bytes;

    debug!(
        target: "tally::recovery",
        txns = stats.txns_applied,
        writes = stats.writes_applied,
        version = stats.final_version,
        "WAL replay complete"
    );

    Ok(stats)
}
