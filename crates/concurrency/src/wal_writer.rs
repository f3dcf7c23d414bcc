//! WAL writer for transactions
//!
//! Writes one transaction's entries to the WAL:
//! - BeginTxn at the start of commit
//! - one Write entry per buffered write, all with the commit version
//! - CommitTxn to finalize (marks the transaction durable)
//!
//! ## Usage
//!
//! ```ignore
//! let mut writer = TransactionWALWriter::new(&mut wal, txn_id);
//! writer.write_begin(timestamp)?;
//! txn.write_to_wal(&mut writer, version)?;
//! writer.write_commit()?;
//! ```

use tally_core::error::Result;
use tally_core::{Key, Timestamp};
use tally_durability::wal::{WALEntry, WAL};

/// Writes transaction operations to WAL
///
/// Tracks the transaction ID so individual writes don't need to specify it.
pub struct TransactionWALWriter<'a> {
    wal: &'a mut WAL,
    txn_id: u64,
}

impl<'a> TransactionWALWriter<'a> {
    /// Create a new WAL writer for a transaction
    pub fn new(wal: &'a mut WAL, txn_id: u64) -> Self {
        TransactionWALWriter { wal, txn_id }
    }

    /// Write BeginTxn entry
    pub fn write_begin(&mut self, timestamp: Timestamp) -> Result<()> {
        self.wal.append(&WALEntry::BeginTxn {
            txn_id: self.txn_id,
            timestamp,
        })?;
        Ok(())
    }

    /// Write the full new value of one record
    pub fn write_put(&mut self, key: Key, value: Vec<u8>, version: u64) -> Result<()> {
        self.wal.append(&WALEntry::Write {
            txn_id: self.txn_id,
            key,
            value,
            version,
        })?;
        Ok(())
    }

    /// Write CommitTxn entry (marks transaction as durable)
    ///
    /// Once this entry is on disk, recovery will replay the transaction.
    pub fn write_commit(&mut self) -> Result<()> {
        self.wal.append(&WALEntry::CommitTxn {
            txn_id: self.txn_id,
        })?;
        Ok(())
    }

    /// Get the transaction ID
    pub fn txn_id(&self) -> u64 {
        self.txn_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::EntityKind;
    use tally_durability::wal::DurabilityMode;
    use tempfile::TempDir;

    fn create_test_wal() -> (WAL, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let wal = WAL::open(temp_dir.path().join("test.wal"), DurabilityMode::Strict).unwrap();
        (wal, temp_dir)
    }

    #[test]
    fn test_full_transaction_sequence() {
        let (mut wal, _temp) = create_test_wal();
        let key = Key::new(EntityKind::User, "alice");

        {
            let mut writer = TransactionWALWriter::new(&mut wal, 3);
            assert_eq!(writer.txn_id(), 3);
            writer.write_begin(Timestamp::from_secs(5)).unwrap();
            writer.write_put(key.clone(), vec![1], 7).unwrap();
            writer.write_commit().unwrap();
        }

        let entries = wal.read_all().unwrap();
        assert_eq!(
            entries,
            vec![
                WALEntry::BeginTxn {
                    txn_id: 3,
                    timestamp: Timestamp::from_secs(5)
                },
                WALEntry::Write {
                    txn_id: 3,
                    key,
                    value: vec![1],
                    version: 7
                },
                WALEntry::CommitTxn { txn_id: 3 },
            ]
        );
    }
}
