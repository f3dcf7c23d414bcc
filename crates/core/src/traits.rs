//! Core trait definitions
//!
//! [`Storage`] is the seam between the transaction layer and the ordered
//! record store. WAL replay and commits both go through `apply_batch`, so
//! a batch is the unit of visibility.

use crate::error::Result;
use crate::types::{EntityKind, Key, VersionedValue};

/// Ordered, versioned record storage
///
/// Implementations must be thread-safe and must apply each batch
/// atomically with respect to readers.
pub trait Storage: Send + Sync {
    /// Latest value stored under `key`
    fn get(&self, key: &Key) -> Result<Option<VersionedValue>>;

    /// Every record of one kind, in ascending id order
    fn scan_kind(&self, kind: EntityKind) -> Result<Vec<(Key, VersionedValue)>>;

    /// Number of records of one kind
    fn count(&self, kind: EntityKind) -> usize;

    /// Apply all writes with the same commit version, atomically
    fn apply_batch(&self, writes: &[(Key, Vec<u8>)], version: u64) -> Result<()>;

    /// Highest version applied so far
    fn current_version(&self) -> u64;
}
