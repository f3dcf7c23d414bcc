//! Transaction context
//!
//! A `TransactionContext` buffers every write made inside a transaction.
//! Reads consult the buffer first (read-your-writes) and fall through to
//! storage. Nothing becomes visible to other readers until the manager
//! applies the buffer as one batch at commit.

use crate::wal_writer::TransactionWALWriter;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tally_core::error::{Error, Result};
use tally_core::{EntityKind, Key, Storage};

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Committed` (commit succeeded)
/// - `Active` → `Aborted` (closure error or commit failure)
///
/// `Committed` and `Aborted` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

/// Buffered state of one transaction
///
/// # Lifecycle
///
/// 1. **BEGIN**: created by the engine with `new()` or `read_only()`
/// 2. **READ/WRITE**: `get()`, `scan_kind()`, `put()`
/// 3. **COMMIT/ABORT**: the manager calls `mark_committed()` or `mark_aborted()`
pub struct TransactionContext {
    /// Unique transaction ID
    pub txn_id: u64,

    /// Storage version when the transaction began
    pub start_version: u64,

    store: Arc<dyn Storage>,

    /// Keys written with their new encoded values (buffered)
    ///
    /// Ordered so WAL entries and applied batches are deterministic.
    pub write_set: BTreeMap<Key, Vec<u8>>,

    /// Current transaction status
    pub status: TransactionStatus,

    read_only: bool,

    start_time: Instant,
}

impl std::fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("txn_id", &self.txn_id)
            .field("start_version", &self.start_version)
            .field("writes", &self.write_set.len())
            .field("status", &self.status)
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl TransactionContext {
    /// Create a read-write transaction over `store`
    pub fn new(txn_id: u64, store: Arc<dyn Storage>) -> Self {
        Self::build(txn_id, store, false)
    }

    /// Create a transaction that rejects writes
    pub fn read_only(store: Arc<dyn Storage>) -> Self {
        Self::build(0, store, true)
    }

    fn build(txn_id: u64, store: Arc<dyn Storage>, read_only: bool) -> Self {
        TransactionContext {
            txn_id,
            start_version: store.current_version(),
            store,
            write_set: BTreeMap::new(),
            status: TransactionStatus::Active,
            read_only,
            start_time: Instant::now(),
        }
    }

    /// Read the current value of `key`, seeing this transaction's own writes
    pub fn get(&self, key: &Key) -> Result<Option<Vec<u8>>> {
        self.ensure_active()?;

        if let Some(value) = self.write_set.get(key) {
            return Ok(Some(value.clone()));
        }
        Ok(self.store.get(key)?.map(|v| v.value))
    }

    /// Whether `key` exists, seeing this transaction's own writes
    pub fn exists(&self, key: &Key) -> Result<bool> {
        self.ensure_active()?;
        Ok(self.write_set.contains_key(key) || self.store.get(key)?.is_some())
    }

    /// Every record of one kind in id order, merged with buffered writes
    pub fn scan_kind(&self, kind: EntityKind) -> Result<Vec<(Key, Vec<u8>)>> {
        self.ensure_active()?;

        let mut merged: BTreeMap<Key, Vec<u8>> = self
            .store
            .scan_kind(kind)?
            .into_iter()
            .map(|(k, v)| (k, v.value))
            .collect();

        for (key, value) in self.write_set.iter().filter(|(k, _)| k.kind == kind) {
            merged.insert(key.clone(), value.clone());
        }

        Ok(merged.into_iter().collect())
    }

    /// Buffer a write; a later write to the same key replaces it
    pub fn put(&mut self, key: Key, value: Vec<u8>) -> Result<()> {
        self.ensure_active()?;
        if self.read_only {
            return Err(Error::InvalidOperation(format!(
                "write to {} inside a read-only transaction",
                key
            )));
        }
        self.write_set.insert(key, value);
        Ok(())
    }

    /// Check if transaction is active
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Check if transaction committed
    pub fn is_committed(&self) -> bool {
        self.status == TransactionStatus::Committed
    }

    /// Check if transaction aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, TransactionStatus::Aborted { .. })
    }

    /// Whether writes are rejected
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Check if transaction can accept operations
    ///
    /// # Errors
    /// Returns `Error::InvalidOperation` if transaction is not `Active`.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::InvalidOperation(format!(
                "Transaction {} is not active: {:?}",
                self.txn_id, self.status
            )))
        }
    }

    /// Transition to Committed state
    ///
    /// # State Transition
    /// `Active` → `Committed`
    pub fn mark_committed(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.status = TransactionStatus::Committed;
        Ok(())
    }

    /// Abort the transaction, discarding all buffered writes
    ///
    /// # State Transition
    /// `Active` → `Aborted`
    pub fn mark_aborted(&mut self, reason: impl Into<String>) -> Result<()> {
        match &self.status {
            TransactionStatus::Committed => Err(Error::InvalidOperation(format!(
                "Cannot abort committed transaction {}",
                self.txn_id
            ))),
            TransactionStatus::Aborted { .. } => Err(Error::InvalidOperation(format!(
                "Transaction {} already aborted",
                self.txn_id
            ))),
            TransactionStatus::Active => {
                self.status = TransactionStatus::Aborted {
                    reason: reason.into(),
                };
                self.write_set.clear();
                Ok(())
            }
        }
    }

    /// Write every buffered write to the WAL with `version`
    pub fn write_to_wal(&self, writer: &mut TransactionWALWriter<'_>, version: u64) -> Result<()> {
        for (key, value) in &self.write_set {
            writer.write_put(key.clone(), value.clone(), version)?;
        }
        Ok(())
    }

    /// Apply every buffered write to `store` as one batch
    ///
    /// Returns the number of writes applied.
    pub fn apply_writes(&self, store: &dyn Storage, version: u64) -> Result<usize> {
        let batch: Vec<(Key, Vec<u8>)> = self
            .write_set
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        store.apply_batch(&batch, version)?;
        Ok(batch.len())
    }

    /// Number of buffered writes
    pub fn write_count(&self) -> usize {
        self.write_set.len()
    }

    /// Time since the transaction began
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}
