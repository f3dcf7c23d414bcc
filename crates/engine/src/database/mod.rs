//! Database struct and open/close logic
//!
//! This module provides the main Database struct that orchestrates:
//! - Storage initialization
//! - WAL opening
//! - Automatic recovery on startup
//! - Transaction API
//!
//! ## Transaction API
//!
//! - `db.transaction(|txn| { ... })` runs a read-modify-write under the
//!   global write lock. Commit on `Ok`, abort on `Err`.
//! - `db.read(|txn| { ... })` runs a read-only closure without the lock.

pub mod config;

pub use config::{TallyConfig, CONFIG_FILE_NAME};

use crate::coordinator::{TransactionCoordinator, TransactionMetrics};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tally_concurrency::{RecoveryCoordinator, TransactionContext};
use tally_core::error::Result;
use tally_core::{EntityKind, Storage, Timestamp};
use tally_durability::wal::{WALEntry, WAL};
use tally_storage::UnifiedStore;
use tracing::{error, info};

/// WAL file name inside the data directory
pub const WAL_FILE_NAME: &str = "tally.wal";

/// Snapshot of database state for `info` style reporting
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseStats {
    /// Number of users
    pub users: usize,
    /// Number of tokens
    pub tokens: usize,
    /// Number of prizes
    pub prizes: usize,
    /// Current commit version
    pub version: u64,
    /// WAL size in bytes (0 for ephemeral databases)
    pub wal_bytes: u64,
    /// Durability mode name, or `"ephemeral"`
    pub durability: &'static str,
    /// Transaction metrics since open
    pub metrics: TransactionMetrics,
}

/// Outcome of a WAL compaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionStats {
    /// Records written to the new log
    pub records: usize,
    /// WAL size before compaction
    pub bytes_before: u64,
    /// WAL size after compaction
    pub bytes_after: u64,
}

/// Main database struct with transaction support
///
/// Orchestrates storage, WAL, recovery, and transactions.
///
/// # Example
///
/// ```text
/// use tally_engine::Database;
///
/// let db = Database::open("/path/to/data")?;
///
/// db.transaction(|txn| {
///     txn.put(key, value)?;
///     Ok(())
/// })?;
/// ```
pub struct Database {
    /// Data directory path (empty for ephemeral databases)
    data_dir: PathBuf,

    /// Ordered in-memory storage
    storage: Arc<UnifiedStore>,

    /// WAL (None for ephemeral databases)
    wal: Option<Mutex<WAL>>,

    /// Lifecycle, version allocation, and metrics
    coordinator: TransactionCoordinator,

    /// Configuration the database was opened with
    config: TallyConfig,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("data_dir", &self.data_dir)
            .field("ephemeral", &self.is_ephemeral())
            .field("version", &self.current_version())
            .finish()
    }
}

impl Database {
    /// Open database at given path with automatic recovery
    ///
    /// Reads `tally.toml` from the data directory to determine durability
    /// mode and password cost. If no config file exists, one is created
    /// with defaults.
    ///
    /// # Flow
    ///
    /// 1. Create data directory if needed
    /// 2. Read or create `tally.toml`
    /// 3. Open WAL, truncate a torn tail, replay committed transactions
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let config_path = path.join(CONFIG_FILE_NAME);
        TallyConfig::write_default_if_missing(&config_path)?;
        let config = TallyConfig::from_file(&config_path)?;

        Self::open_with_config(path, config)
    }

    /// Open database at given path with an explicit config
    ///
    /// `tally.toml` is neither read nor written.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: TallyConfig) -> Result<Arc<Self>> {
        config.validate()?;
        let durability_mode = config.durability_mode()?;

        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let recovery = RecoveryCoordinator::new(data_dir.join(WAL_FILE_NAME))
            .with_durability_mode(durability_mode)
            .recover()?;

        info!(
            target: "tally::db",
            path = %data_dir.display(),
            mode = durability_mode.name(),
            txns = recovery.stats.txns_replayed,
            version = recovery.stats.final_version,
            "Database opened"
        );

        Ok(Arc::new(Self {
            data_dir,
            storage: Arc::new(recovery.storage),
            wal: Some(Mutex::new(recovery.wal)),
            coordinator: TransactionCoordinator::from_manager(recovery.txn_manager),
            config,
        }))
    }

    /// Open an in-memory database with no files
    ///
    /// Data is lost when the database is dropped.
    pub fn ephemeral() -> Arc<Self> {
        Self::ephemeral_with_config(TallyConfig::default())
    }

    /// Open an in-memory database with an explicit config
    pub fn ephemeral_with_config(config: TallyConfig) -> Arc<Self> {
        Arc::new(Self {
            data_dir: PathBuf::new(),
            storage: Arc::new(UnifiedStore::new()),
            wal: None,
            coordinator: TransactionCoordinator::new(0),
            config,
        })
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Execute a closure within a transaction
    ///
    /// The global write lock is held from before the first read until the
    /// commit finishes, so the closure's read-modify-write is never
    /// interleaved with another writer.
    ///
    /// - `Ok(value)`: buffered writes are logged and applied as one batch
    /// - `Err(e)`: buffered writes are discarded and `e` is returned
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TransactionContext) -> Result<T>,
    {
        self.transaction_with_version(f).map(|(value, _)| value)
    }

    /// Like `transaction()` but also returns the commit version
    pub fn transaction_with_version<F, T>(&self, f: F) -> Result<(T, u64)>
    where
        F: FnOnce(&mut TransactionContext) -> Result<T>,
    {
        let _guard = self.coordinator.lock_writes();
        let mut txn = self.coordinator.start_transaction(self.storage_dyn());

        let value = match f(&mut txn) {
            Ok(value) => value,
            Err(e) => {
                self.coordinator.abort(&mut txn, &e.to_string());
                return Err(e);
            }
        };

        let mut wal = self.wal.as_ref().map(|w| w.lock());
        let version = self
            .coordinator
            .commit(
                &mut txn,
                self.storage.as_ref(),
                wal.as_deref_mut(),
                Timestamp::now(),
            )
            .map_err(|e| {
                error!(target: "tally::db", error = %e, "Commit failed");
                e
            })?;

        Ok((value, version))
    }

    /// Execute a read-only closure
    ///
    /// Does not take the write lock. Each committed batch is visible
    /// entirely or not at all.
    pub fn read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&TransactionContext) -> Result<T>,
    {
        let txn = TransactionContext::read_only(self.storage_dyn());
        f(&txn)
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Force all committed transactions to disk
    pub fn flush(&self) -> Result<()> {
        if let Some(wal) = &self.wal {
            wal.lock().fsync()?;
        }
        Ok(())
    }

    /// Rewrite the WAL so it holds only the live records
    ///
    /// The new log is one committed transaction carrying every record.
    /// Writers are blocked for the duration.
    pub fn compact(&self) -> Result<CompactionStats> {
        let Some(wal) = &self.wal else {
            return Ok(CompactionStats {
                records: self.storage.len(),
                bytes_before: 0,
                bytes_after: 0,
            });
        };

        let _guard = self.coordinator.lock_writes();
        let mut wal = wal.lock();
        let bytes_before = wal.size();

        let records = self.storage.dump();
        let entries = if records.is_empty() {
            Vec::new()
        } else {
            let txn_id = self.coordinator.next_txn_id();
            let mut entries = Vec::with_capacity(records.len() + 2);
            entries.push(WALEntry::BeginTxn {
                txn_id,
                timestamp: Timestamp::now(),
            });
            entries.extend(records.iter().map(|(key, v)| WALEntry::Write {
                txn_id,
                key: key.clone(),
                value: v.value.clone(),
                version: v.version,
            }));
            entries.push(WALEntry::CommitTxn { txn_id });
            entries
        };

        wal.rewrite(&entries)?;

        let stats = CompactionStats {
            records: records.len(),
            bytes_before,
            bytes_after: wal.size(),
        };
        info!(
            target: "tally::db",
            records = stats.records,
            before = stats.bytes_before,
            after = stats.bytes_after,
            "WAL compacted"
        );
        Ok(stats)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    fn storage_dyn(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }

    /// Underlying storage
    pub fn storage(&self) -> &Arc<UnifiedStore> {
        &self.storage
    }

    /// Data directory (empty for ephemeral databases)
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Whether the database has no files
    pub fn is_ephemeral(&self) -> bool {
        self.wal.is_none()
    }

    /// Configuration the database was opened with
    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// Current commit version
    pub fn current_version(&self) -> u64 {
        self.coordinator.current_version()
    }

    /// Transaction metrics since open
    pub fn metrics(&self) -> TransactionMetrics {
        self.coordinator.metrics()
    }

    /// Record counts, version, WAL size, and metrics
    pub fn stats(&self) -> DatabaseStats {
        let (wal_bytes, durability) = match &self.wal {
            Some(wal) => {
                let wal = wal.lock();
                (wal.size(), wal.durability_mode().name())
            }
            None => (0, "ephemeral"),
        };

        DatabaseStats {
            users: self.storage.count(EntityKind::User),
            tokens: self.storage.count(EntityKind::Token),
            prizes: self.storage.count(EntityKind::Prize),
            version: self.current_version(),
            wal_bytes,
            durability,
            metrics: self.metrics(),
        }
    }
}
