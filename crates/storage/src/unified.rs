//! UnifiedStore: ordered storage backend with BTreeMap and version tracking
//!
//! This module implements the Storage trait using:
//! - `BTreeMap<Key, VersionedValue>` for ordered key storage
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for the highest applied commit version
//!
//! # Design Notes
//!
//! - **No version history**: Each key stores only its latest value
//! - **No deletes**: ledger records are never removed
//! - **Versions come from the caller**: the transaction manager allocates
//!   commit versions; WAL replay reuses the versions recorded in the log

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use tally_core::{EntityKind, Key, Result, Storage, VersionedValue};

/// Unified storage backend using BTreeMap with RwLock
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicU64`.
/// Readers never observe a half-applied batch.
#[derive(Debug, Default)]
pub struct UnifiedStore {
    /// The main data store: ordered map from Key to encoded record
    data: RwLock<BTreeMap<Key, VersionedValue>>,
    /// Highest commit version applied
    version: AtomicU64,
}

impl UnifiedStore {
    /// Create a new empty UnifiedStore
    ///
    /// Initial version is 0 (no writes have occurred).
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all kinds
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy every record in key order
    ///
    /// Used by WAL compaction to rewrite the live state.
    pub fn dump(&self) -> Vec<(Key, VersionedValue)> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Storage for UnifiedStore {
    fn get(&self, key: &Key) -> Result<Option<VersionedValue>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn scan_kind(&self, kind: EntityKind) -> Result<Vec<(Key, VersionedValue)>> {
        let data = self.data.read();

        let results = data
            .range(Key::first_of(kind)..)
            .take_while(|(k, _)| k.kind == kind)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(results)
    }

    fn count(&self, kind: EntityKind) -> usize {
        self.data
            .read()
            .range(Key::first_of(kind)..)
            .take_while(|(k, _)| k.kind == kind)
            .count()
    }

    fn apply_batch(&self, writes: &[(Key, Vec<u8>)], version: u64) -> Result<()> {
        // Hold the write lock for the whole batch so no reader sees a partial transaction
        let mut data = self.data.write();

        for (key, value) in writes {
            data.insert(
                key.clone(),
                VersionedValue {
                    value: value.clone(),
                    version,
                },
            );
        }

        self.version.fetch_max(version, Ordering::SeqCst);
        trace!(target: "tally::storage", writes = writes.len(), version, "Batch applied");

        Ok(())
    }

    fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    fn key(kind: EntityKind, id: &str) -> Key {
        Key::new(kind, id)
    }

    #[test]
    fn test_store_creation() {
        let store = UnifiedStore::new();
        assert_eq!(store.current_version(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_apply_and_get() {
        let store = UnifiedStore::new();
        let k = key(EntityKind::User, "alice");

        store.apply_batch(&[(k.clone(), vec![1, 2, 3])], 1).unwrap();

        let got = store.get(&k).unwrap().unwrap();
        assert_eq!(got.value, vec![1, 2, 3]);
        assert_eq!(got.version, 1);
        assert_eq!(store.current_version(), 1);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = UnifiedStore::new();
        assert!(store.get(&key(EntityKind::Prize, "nope")).unwrap().is_none());
    }

    #[test]
    fn test_overwrite_updates_version() {
        let store = UnifiedStore::new();
        let k = key(EntityKind::Token, "t");

        store.apply_batch(&[(k.clone(), vec![1])], 1).unwrap();
        store.apply_batch(&[(k.clone(), vec![2])], 2).unwrap();

        let got = store.get(&k).unwrap().unwrap();
        assert_eq!(got.value, vec![2]);
        assert_eq!(got.version, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_version_never_moves_backwards() {
        let store = UnifiedStore::new();
        store.apply_batch(&[(key(EntityKind::User, "a"), vec![])], 5).unwrap();
        store.apply_batch(&[(key(EntityKind::User, "b"), vec![])], 3).unwrap();
        assert_eq!(store.current_version(), 5);
    }

    #[test]
    fn test_scan_kind_is_isolated_and_ordered() {
        let store = UnifiedStore::new();
        store
            .apply_batch(
                &[
                    (key(EntityKind::User, "charlie"), vec![3]),
                    (key(EntityKind::Token, "t1"), vec![9]),
                    (key(EntityKind::User, "alice"), vec![1]),
                    (key(EntityKind::Prize, "p1"), vec![8]),
                    (key(EntityKind::User, "bob"), vec![2]),
                ],
                1,
            )
            .unwrap();

        let users: Vec<String> = store
            .scan_kind(EntityKind::User)
            .unwrap()
            .into_iter()
            .map(|(k, _)| k.id)
            .collect();
        assert_eq!(users, vec!["alice", "bob", "charlie"]);

        assert_eq!(store.count(EntityKind::User), 3);
        assert_eq!(store.count(EntityKind::Token), 1);
        assert_eq!(store.count(EntityKind::Prize), 1);
    }

    #[test]
    fn test_scan_empty_kind() {
        let store = UnifiedStore::new();
        store.apply_batch(&[(key(EntityKind::User, "a"), vec![])], 1).unwrap();
        assert!(store.scan_kind(EntityKind::Prize).unwrap().is_empty());
    }

    #[test]
    fn test_dump_in_key_order() {
        let store = UnifiedStore::new();
        store
            .apply_batch(
                &[
                    (key(EntityKind::Prize, "p"), vec![]),
                    (key(EntityKind::User, "u"), vec![]),
                ],
                1,
            )
            .unwrap();
        let dumped: Vec<Key> = store.dump().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            dumped,
            vec![key(EntityKind::User, "u"), key(EntityKind::Prize, "p")]
        );
    }

    #[test]
    fn test_concurrent_batches() {
        let store = Arc::new(UnifiedStore::new());
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..50u64 {
                        let k = key(EntityKind::User, &format!("{t}-{i}"));
                        store.apply_batch(&[(k, vec![t as u8])], t * 100 + i + 1).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.count(EntityKind::User), 400);
        assert_eq!(store.current_version(), 750);
    }

    #[test]
    fn test_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<UnifiedStore>();
    }

    proptest! {
        #[test]
        fn prop_scan_returns_sorted_unique_ids(ids in proptest::collection::vec("[a-z0-9]{1,8}", 0..40)) {
            let store = UnifiedStore::new();
            let writes: Vec<(Key, Vec<u8>)> = ids
                .iter()
                .map(|id| (key(EntityKind::Token, id), Vec::new()))
                .collect();
            store.apply_batch(&writes, 1).unwrap();

            let scanned: Vec<String> = store
                .scan_kind(EntityKind::Token)
                .unwrap()
                .into_iter()
                .map(|(k, _)| k.id)
                .collect();

            let mut expected = ids.clone();
            expected.sort();
            expected.dedup();
            prop_assert_eq!(scanned, expected);
        }
    }
}
