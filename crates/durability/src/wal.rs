//! WAL (Write-Ahead Log) entry types and file operations
//!
//! This module defines the WAL entry types for the durability layer:
//! - BeginTxn: Start of a transaction
//! - Write: Full new value of one record
//! - CommitTxn: Successful transaction completion
//! - AbortTxn: Transaction rollback
//!
//! A committed transaction appears in the log as one contiguous group
//! `BeginTxn, Write*, CommitTxn`. Only groups that end in `CommitTxn`
//! survive recovery.
//!
//! ## File Operations
//!
//! - `WAL::open()` - Open existing WAL or create new one
//! - `WAL::append()` - Write encoded entry to end of file
//! - `WAL::scan()` - Decode the whole file, reporting where valid data ends
//! - `WAL::read_all()` - Decoded entries only
//! - `WAL::truncate()` - Cut a torn tail off the file
//! - `WAL::rollback_to()` - Undo a transaction whose commit failed
//! - `WAL::rewrite()` - Atomically replace the file contents (compaction)
//! - `WAL::flush()` / `WAL::fsync()` - Push buffered writes to the OS / disk
//!
//! ## Durability Modes
//!
//! - `Strict` - fsync at every commit (slow, maximum durability)
//! - `Batched` - fsync every N commits OR T ms (DEFAULT, good balance)
//! - `Async` - background thread fsyncs periodically (fast, may lose recent writes)

use crate::encoding::{decode_entry, encode_entry};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tally_core::{
    error::{Error, Result},
    Key, Timestamp,
};
use tracing::debug;

/// WAL entry types
///
/// Each entry represents a state-changing operation that must be persisted
/// before it can be considered durable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum WALEntry {
    /// Transaction start marker
    BeginTxn {
        /// Transaction identifier
        txn_id: u64,
        /// Time the transaction committed
        timestamp: Timestamp,
    },

    /// Full encoded value of one record
    Write {
        /// Owning transaction
        txn_id: u64,
        /// Record key
        key: Key,
        /// bincode-encoded record
        value: Vec<u8>,
        /// Commit version assigned to the transaction
        version: u64,
    },

    /// Transaction committed; its writes must be replayed
    CommitTxn {
        /// Transaction identifier
        txn_id: u64,
    },

    /// Transaction rolled back; its writes must be discarded
    AbortTxn {
        /// Transaction identifier
        txn_id: u64,
    },
}

impl WALEntry {
    /// Transaction this entry belongs to
    pub fn txn_id(&self) -> u64 {
        match self {
            WALEntry::BeginTxn { txn_id, .. }
            | WALEntry::Write { txn_id, .. }
            | WALEntry::CommitTxn { txn_id }
            | WALEntry::AbortTxn { txn_id } => *txn_id,
        }
    }

    /// Commit version carried by a Write entry
    pub fn version(&self) -> Option<u64> {
        match self {
            WALEntry::Write { version, .. } => Some(*version),
            _ => None,
        }
    }

    /// Whether this entry closes a transaction (commit or abort)
    pub fn is_txn_boundary(&self) -> bool {
        matches!(self, WALEntry::CommitTxn { .. } | WALEntry::AbortTxn { .. })
    }
}

// ============================================================================
// Durability Mode
// ============================================================================

/// Durability mode configuration
///
/// Controls when fsync is called to ensure data reaches disk.
///
/// The default mode is `Batched { interval_ms: 100, batch_size: 1000 }`,
/// which fsyncs every 100ms or every 1000 commits, whichever comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// fsync at every commit
    ///
    /// A transaction that returned successfully survives power loss.
    Strict,

    /// fsync every N commits OR every T milliseconds
    ///
    /// May lose up to batch_size commits or interval_ms of data on power
    /// loss. A process crash loses nothing that was flushed.
    Batched {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum commits between fsyncs
        batch_size: usize,
    },

    /// Background thread fsyncs periodically
    Async {
        /// Time between fsyncs in milliseconds
        interval_ms: u64,
    },
}

impl Default for DurabilityMode {
    fn default() -> Self {
        DurabilityMode::Batched {
            interval_ms: 100,
            batch_size: 1000,
        }
    }
}

impl DurabilityMode {
    /// Short human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            DurabilityMode::Strict => "strict",
            DurabilityMode::Batched { .. } => "batched",
            DurabilityMode::Async { .. } => "async",
        }
    }
}

// ============================================================================
// WAL File Operations
// ============================================================================

/// Result of decoding a WAL file from the start
#[derive(Debug, Default)]
pub struct WalScan {
    /// Entries decoded before the first invalid byte
    pub entries: Vec<WALEntry>,
    /// Byte length of the valid prefix
    pub valid_len: u64,
    /// Byte length of the whole file
    pub file_len: u64,
    /// Why decoding stopped early, if it did
    pub stop_reason: Option<String>,
}

impl WalScan {
    /// Whether the file has bytes past the valid prefix
    pub fn has_invalid_tail(&self) -> bool {
        self.valid_len < self.file_len
    }
}

/// Write-Ahead Log with configurable durability
///
/// Append-only log of WAL entries persisted to disk.
///
/// # Example
///
/// ```ignore
/// use tally_durability::wal::{WAL, WALEntry, DurabilityMode};
///
/// let mut wal = WAL::open("data/tally.wal", DurabilityMode::Strict)?;
/// wal.append(&WALEntry::CommitTxn { txn_id: 1 })?;
///
/// let entries = wal.read_all()?;
/// ```
pub struct WAL {
    /// File path
    path: PathBuf,

    /// File handle (buffered writer for appends, shared with the async thread)
    writer: Arc<Mutex<BufWriter<File>>>,

    /// Current file offset
    current_offset: AtomicU64,

    /// Durability mode
    durability_mode: DurabilityMode,

    /// Last fsync time (for batched mode)
    last_fsync: Mutex<Instant>,

    /// Commits since last fsync (for batched mode)
    commits_since_fsync: AtomicU64,

    /// Background fsync thread handle (for async mode)
    fsync_thread: Option<JoinHandle<()>>,

    /// Shutdown flag for async thread
    shutdown: Arc<AtomicBool>,
}

impl std::fmt::Debug for WAL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WAL")
            .field("path", &self.path)
            .field("size", &self.size())
            .field("durability_mode", &self.durability_mode)
            .finish()
    }
}

fn open_append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new()
        .create(true)
        .append(true)
        .read(true)
        .open(path)?)
}

impl WAL {
    /// Open existing WAL or create new one with specified durability mode
    ///
    /// Creates parent directories if they don't exist.
    pub fn open<P: AsRef<Path>>(path: P, durability_mode: DurabilityMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = open_append(&path)?;
        let current_offset = AtomicU64::new(file.metadata()?.len());

        let writer = Arc::new(Mutex::new(BufWriter::new(file)));
        let shutdown = Arc::new(AtomicBool::new(false));

        let fsync_thread = if let DurabilityMode::Async { interval_ms } = durability_mode {
            let writer = Arc::clone(&writer);
            let shutdown = Arc::clone(&shutdown);
            let interval = Duration::from_millis(interval_ms);

            Some(thread::spawn(move || {
                while !shutdown.load(Ordering::Relaxed) {
                    thread::sleep(interval);

                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }

                    let mut w = writer.lock();
                    let _ = w.flush();
                    let _ = w.get_mut().sync_all();
                }
            }))
        } else {
            None
        };

        debug!(target: "tally::wal", path = %path.display(), mode = durability_mode.name(), "WAL opened");

        Ok(Self {
            path,
            writer,
            current_offset,
            durability_mode,
            last_fsync: Mutex::new(Instant::now()),
            commits_since_fsync: AtomicU64::new(0),
            fsync_thread,
            shutdown,
        })
    }

    /// Append entry to WAL with durability mode handling
    ///
    /// Entries inside a transaction are only buffered. When a commit or
    /// abort marker is appended the durability mode decides what happens:
    /// - Strict: flush and fsync
    /// - Batched: fsync after batch_size commits OR interval_ms elapsed, flush otherwise
    /// - Async: flush, background thread handles fsync
    ///
    /// Returns the offset where the entry was written.
    pub fn append(&mut self, entry: &WALEntry) -> Result<u64> {
        let offset = self.current_offset.load(Ordering::SeqCst);
        let encoded = encode_entry(entry)?;

        self.writer.lock().write_all(&encoded).map_err(|e| {
            Error::StorageError(format!("Failed to write entry at offset {}: {}", offset, e))
        })?;

        self.current_offset
            .fetch_add(encoded.len() as u64, Ordering::SeqCst);

        if !entry.is_txn_boundary() {
            return Ok(offset);
        }

        match self.durability_mode {
            DurabilityMode::Strict => self.fsync()?,
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => {
                let commits = self.commits_since_fsync.fetch_add(1, Ordering::SeqCst) + 1;
                let should_fsync = {
                    let elapsed = self.last_fsync.lock().elapsed().as_millis() as u64;
                    elapsed >= interval_ms || commits >= batch_size as u64
                };

                if should_fsync {
                    self.fsync()?;
                    self.commits_since_fsync.store(0, Ordering::SeqCst);
                    *self.last_fsync.lock() = Instant::now();
                } else {
                    self.flush()?;
                }
            }
            DurabilityMode::Async { .. } => self.flush()?,
        }

        Ok(offset)
    }

    /// Flush buffered writes to OS buffers
    ///
    /// Survives a process crash but not necessarily power loss.
    pub fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .flush()
            .map_err(|e| Error::StorageError(format!("Failed to flush WAL: {}", e)))
    }

    /// Force sync to disk (flush + fsync)
    pub fn fsync(&self) -> Result<()> {
        let mut writer = self.writer.lock();

        writer
            .flush()
            .map_err(|e| Error::StorageError(format!("Failed to flush: {}", e)))?;
        writer
            .get_mut()
            .sync_all()
            .map_err(|e| Error::StorageError(format!("Failed to fsync: {}", e)))?;

        Ok(())
    }

    /// Decode every entry from the beginning of the file
    ///
    /// Decoding stops at the first entry that is incomplete or fails its
    /// checksum. Everything before that point is returned together with the
    /// length of the valid prefix, so the caller can decide to truncate.
    pub fn scan(&self) -> Result<WalScan> {
        self.flush()?;

        let bytes = std::fs::read(&self.path)?;
        let file_len = bytes.len() as u64;

        let mut entries = Vec::new();
        let mut pos = 0usize;
        let mut stop_reason = None;

        while pos < bytes.len() {
            match decode_entry(&bytes[pos..], pos as u64) {
                Ok((entry, consumed)) => {
                    entries.push(entry);
                    pos += consumed;
                }
                Err(e) => {
                    stop_reason = Some(e.to_string());
                    break;
                }
            }
        }

        Ok(WalScan {
            entries,
            valid_len: pos as u64,
            file_len,
            stop_reason,
        })
    }

    /// Read all valid entries from the beginning of the file
    pub fn read_all(&self) -> Result<Vec<WALEntry>> {
        Ok(self.scan()?.entries)
    }

    /// Cut the file down to `len` bytes and sync
    ///
    /// Used by recovery to drop a torn tail so new appends follow valid data.
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        let mut writer = self.writer.lock();
        writer
            .flush()
            .map_err(|e| Error::StorageError(format!("Failed to flush: {}", e)))?;
        writer.get_mut().set_len(len)?;
        writer.get_mut().sync_all()?;
        self.current_offset.store(len, Ordering::SeqCst);

        debug!(target: "tally::wal", len, "WAL truncated");
        Ok(())
    }

    /// Drop everything from `len` onward, including bytes still buffered
    ///
    /// Used to undo a transaction whose commit failed partway. Unlike
    /// [`truncate`](Self::truncate) the buffer is discarded rather than
    /// flushed, so a half-written frame never reaches the file.
    pub fn rollback_to(&mut self, len: u64) -> Result<()> {
        let mut writer = self.writer.lock();
        let fresh = BufWriter::new(open_append(&self.path)?);
        let (file, _discarded) = std::mem::replace(&mut *writer, fresh).into_parts();

        file.set_len(len)
            .map_err(|e| Error::StorageError(format!("Failed to roll back WAL: {}", e)))?;
        file.sync_all()
            .map_err(|e| Error::StorageError(format!("Failed to fsync rollback: {}", e)))?;
        *writer = BufWriter::new(file);
        self.current_offset.store(len, Ordering::SeqCst);

        debug!(target: "tally::wal", len, "WAL rolled back");
        Ok(())
    }

    /// Replace the file contents with `entries`
    ///
    /// The new log is written to a sibling temp file, synced and renamed
    /// over the old one, so a crash leaves either the old or the new log.
    pub fn rewrite(&mut self, entries: &[WALEntry]) -> Result<()> {
        let tmp_path = self.path.with_extension("wal.tmp");

        let mut len = 0u64;
        {
            let file = File::create(&tmp_path)?;
            let mut out = BufWriter::new(file);
            for entry in entries {
                let encoded = encode_entry(entry)?;
                out.write_all(&encoded)?;
                len += encoded.len() as u64;
            }
            out.flush()?;
            out.get_ref().sync_all()?;
        }

        let mut writer = self.writer.lock();
        writer
            .flush()
            .map_err(|e| Error::StorageError(format!("Failed to flush: {}", e)))?;

        std::fs::rename(&tmp_path, &self.path)?;
        if let Some(parent) = self.path.parent() {
            // Directory fsync is not supported everywhere
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        *writer = BufWriter::new(open_append(&self.path)?);
        self.current_offset.store(len, Ordering::SeqCst);
        self.commits_since_fsync.store(0, Ordering::SeqCst);

        debug!(target: "tally::wal", entries = entries.len(), bytes = len, "WAL rewritten");
        Ok(())
    }

    /// Get current file size (offset for next write)
    pub fn size(&self) -> u64 {
        self.current_offset.load(Ordering::SeqCst)
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get durability mode
    pub fn durability_mode(&self) -> DurabilityMode {
        self.durability_mode
    }
}

impl Drop for WAL {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        if let Some(handle) = self.fsync_thread.take() {
            let _ = handle.join();
        }

        let _ = self.fsync();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::EntityKind;
    use tempfile::TempDir;

    fn write(txn_id: u64, id: &str, version: u64) -> WALEntry {
        WALEntry::Write {
            txn_id,
            key: Key::new(EntityKind::User, id),
            value: id.as_bytes().to_vec(),
            version,
        }
    }

    fn txn(txn_id: u64, ids: &[&str]) -> Vec<WALEntry> {
        let mut entries = vec![WALEntry::BeginTxn {
            txn_id,
            timestamp: Timestamp::from_secs(txn_id),
        }];
        entries.extend(ids.iter().map(|id| write(txn_id, id, txn_id)));
        entries.push(WALEntry::CommitTxn { txn_id });
        entries
    }

    #[test]
    fn test_entry_helpers() {
        let w = write(3, "a", 9);
        assert_eq!(w.txn_id(), 3);
        assert_eq!(w.version(), Some(9));
        assert!(!w.is_txn_boundary());
        assert!(WALEntry::CommitTxn { txn_id: 3 }.is_txn_boundary());
        assert!(WALEntry::AbortTxn { txn_id: 3 }.is_txn_boundary());
        assert_eq!(WALEntry::CommitTxn { txn_id: 3 }.version(), None);
    }

    #[test]
    fn test_open_new_wal() {
        let dir = TempDir::new().unwrap();
        let wal = WAL::open(dir.path().join("tally.wal"), DurabilityMode::Strict).unwrap();
        assert_eq!(wal.size(), 0);
        assert!(wal.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_wal_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("tally.wal");
        let _wal = WAL::open(&path, DurabilityMode::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_append_and_read() {
        let dir = TempDir::new().unwrap();
        let mut wal = WAL::open(dir.path().join("tally.wal"), DurabilityMode::Strict).unwrap();

        let entries = txn(1, &["alice", "bob"]);
        let mut last_offset = None;
        for e in &entries {
            let offset = wal.append(e).unwrap();
            if let Some(prev) = last_offset {
                assert!(offset > prev);
            }
            last_offset = Some(offset);
        }

        assert_eq!(wal.read_all().unwrap(), entries);
    }

    #[test]
    fn test_reopen_wal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tally.wal");

        {
            let mut wal = WAL::open(&path, DurabilityMode::default()).unwrap();
            for e in txn(1, &["alice"]) {
                wal.append(&e).unwrap();
            }
        }

        let mut wal = WAL::open(&path, DurabilityMode::default()).unwrap();
        assert!(wal.size() > 0);
        for e in txn(2, &["bob"]) {
            wal.append(&e).unwrap();
        }

        let entries = wal.read_all().unwrap();
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[5], WALEntry::CommitTxn { txn_id: 2 });
    }

    #[test]
    fn test_rollback_drops_committed_and_buffered_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tally.wal");
        let mode = DurabilityMode::Batched {
            interval_ms: 60_000,
            batch_size: 1_000,
        };

        let mut wal = WAL::open(&path, mode).unwrap();
        for e in txn(1, &["alice"]) {
            wal.append(&e).unwrap();
        }
        let start = wal.size();

        for e in txn(2, &["bob"]) {
            wal.append(&e).unwrap();
        }
        // Still in the buffer when the rollback happens
        wal.append(&WALEntry::BeginTxn {
            txn_id: 3,
            timestamp: Timestamp::EPOCH,
        })
        .unwrap();

        wal.rollback_to(start).unwrap();
        assert_eq!(wal.size(), start);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), start);

        for e in txn(4, &["carol"]) {
            wal.append(&e).unwrap();
        }
        drop(wal);

        let wal = WAL::open(&path, DurabilityMode::Strict).unwrap();
        let scan = wal.scan().unwrap();
        assert!(!scan.has_invalid_tail());
        let txn_ids: Vec<u64> = scan.entries.iter().map(|e| e.txn_id()).collect();
        assert_eq!(txn_ids, vec![1, 1, 1, 4, 4, 4]);
    }

    #[test]
    fn test_scan_reports_torn_tail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tally.wal");

        let valid_len = {
            let mut wal = WAL::open(&path, DurabilityMode::Strict).unwrap();
            for e in txn(1, &["alice"]) {
                wal.append(&e).unwrap();
            }
            wal.size()
        };

        // Half-written entry at the end
        {
            let encoded = encode_entry(&write(2, "bob", 2)).unwrap();
            let mut f = OpenOptions::new().append(true).open(&path).unwrap();
            f.write_all(&encoded[..encoded.len() / 2]).unwrap();
        }

        let mut wal = WAL::open(&path, DurabilityMode::Strict).unwrap();
        let scan = wal.scan().unwrap();
        assert_eq!(scan.entries.len(), 3);
        assert_eq!(scan.valid_len, valid_len);
        assert!(scan.has_invalid_tail());
        assert!(scan.stop_reason.is_some());

        wal.truncate(scan.valid_len).unwrap();
        assert_eq!(wal.size(), valid_len);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), valid_len);

        for e in txn(2, &["bob"]) {
            wal.append(&e).unwrap();
        }
        let scan = wal.scan().unwrap();
        assert!(!scan.has_invalid_tail());
        assert_eq!(scan.entries.len(), 6);
    }

    #[test]
    fn test_rewrite_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tally.wal");
        let mut wal = WAL::open(&path, DurabilityMode::Strict).unwrap();

        for i in 1..=5 {
            for e in txn(i, &["alice"]) {
                wal.append(&e).unwrap();
            }
        }
        let before = wal.size();

        let compacted = txn(6, &["alice"]);
        wal.rewrite(&compacted).unwrap();
        assert!(wal.size() < before);
        assert_eq!(wal.read_all().unwrap(), compacted);
        assert!(!dir.path().join("tally.wal.tmp").exists());

        // Appends continue after the rewritten contents
        for e in txn(7, &["bob"]) {
            wal.append(&e).unwrap();
        }
        assert_eq!(wal.read_all().unwrap().len(), compacted.len() + 3);
    }

    #[test]
    fn test_durability_mode_default() {
        assert_eq!(
            DurabilityMode::default(),
            DurabilityMode::Batched {
                interval_ms: 100,
                batch_size: 1000
            }
        );
        assert_eq!(DurabilityMode::Strict.name(), "strict");
    }

    #[test]
    fn test_batched_mode_by_count() {
        let dir = TempDir::new().unwrap();
        let mode = DurabilityMode::Batched {
            interval_ms: 60_000,
            batch_size: 2,
        };
        let mut wal = WAL::open(dir.path().join("tally.wal"), mode).unwrap();

        for i in 1..=3 {
            for e in txn(i, &["a"]) {
                wal.append(&e).unwrap();
            }
        }
        // Third commit is flushed but not yet counted towards the next fsync
        assert_eq!(wal.commits_since_fsync.load(Ordering::SeqCst), 1);
        assert_eq!(wal.read_all().unwrap().len(), 9);
    }

    #[test]
    fn test_async_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tally.wal");
        {
            let mut wal = WAL::open(&path, DurabilityMode::Async { interval_ms: 10 }).unwrap();
            for e in txn(1, &["alice"]) {
                wal.append(&e).unwrap();
            }
            thread::sleep(Duration::from_millis(30));
        }

        let wal = WAL::open(&path, DurabilityMode::Strict).unwrap();
        assert_eq!(wal.read_all().unwrap().len(), 3);
    }

    #[test]
    fn test_drop_performs_final_fsync() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tally.wal");
        {
            let mode = DurabilityMode::Batched {
                interval_ms: 60_000,
                batch_size: 1000,
            };
            let mut wal = WAL::open(&path, mode).unwrap();
            wal.append(&WALEntry::BeginTxn {
                txn_id: 1,
                timestamp: Timestamp::from_secs(1),
            })
            .unwrap();
        }
        let wal = WAL::open(&path, DurabilityMode::Strict).unwrap();
        assert_eq!(wal.read_all().unwrap().len(), 1);
    }
}
