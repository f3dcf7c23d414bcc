//! Repository: typed storage for one record collection
//!
//! ## Design
//!
//! `Repository<E>` is a stateless facade over the Database engine. It holds
//! no in-memory state beyond an `Arc<Database>` reference.
//!
//! ## API
//!
//! - `get(id)` - Latest record, or `None` when absent
//! - `insert(record)` - Insert or overwrite, persisted before returning
//! - `list()` - Every record in ascending id order
//!
//! The `*_in` variants run against an open transaction instead, so several
//! collections can be read and written under one commit.
//!
//! Apart from `require_in`, a missing id is never an error here; callers
//! decide what absence means.

use super::extensions::RecordStoreExt;
use crate::database::Database;
use std::marker::PhantomData;
use std::sync::Arc;
use tally_concurrency::TransactionContext;
use tally_core::{Entity, Error, Result, Storage};

/// Typed record collection
///
/// # Example
///
/// ```ignore
/// let db = Database::open("/path/to/data")?;
/// let prizes: Repository<Prize> = Repository::new(db);
///
/// prizes.insert(&prize)?;
/// let found = prizes.get(&prize.id)?;
/// ```
pub struct Repository<E: Entity> {
    db: Arc<Database>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self::new(self.db.clone())
    }
}

impl<E: Entity> std::fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository").field("kind", &E::KIND).finish()
    }
}

impl<E: Entity> Repository<E> {
    /// Create new repository instance
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }

    /// Get a record by id
    pub fn get(&self, id: &str) -> Result<Option<E>> {
        self.db.read(|txn| txn.record_get(id))
    }

    /// Insert or overwrite a record, keyed by its own id
    ///
    /// Returns the commit version of the write.
    pub fn insert(&self, record: &E) -> Result<u64> {
        let ((), version) = self.db.transaction_with_version(|txn| txn.record_put(record))?;
        Ok(version)
    }

    /// Every record in ascending id order
    pub fn list(&self) -> Result<Vec<E>> {
        self.db.read(|txn| txn.record_list())
    }

    /// The database this collection lives in
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.db.storage().count(E::KIND)
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========== Transactional view ==========

    /// Get a record as seen by `txn`, including its buffered writes
    pub fn get_in(&self, txn: &TransactionContext, id: &str) -> Result<Option<E>> {
        txn.record_get(id)
    }

    /// Get a record as seen by `txn`, or `NotFound`
    pub fn require_in(&self, txn: &TransactionContext, id: &str) -> Result<E> {
        self.get_in(txn, id)?
            .ok_or_else(|| Error::not_found(E::KIND, id))
    }

    /// Whether `txn` sees a record at `id`
    pub fn contains_in(&self, txn: &TransactionContext, id: &str) -> Result<bool> {
        txn.record_exists::<E>(id)
    }

    /// Buffer an insert or overwrite in `txn`
    pub fn insert_in(&self, txn: &mut TransactionContext, record: &E) -> Result<()> {
        txn.record_put(record)
    }
}

// ========== RecordStoreExt Implementation ==========

impl RecordStoreExt for TransactionContext {
    fn record_get<E: Entity>(&self, id: &str) -> Result<Option<E>> {
        self.get(&E::key_for(id))?
            .map(|bytes| E::decode(&bytes))
            .transpose()
    }

    fn record_exists<E: Entity>(&self, id: &str) -> Result<bool> {
        self.exists(&E::key_for(id))
    }

    fn record_put<E: Entity>(&mut self, record: &E) -> Result<()> {
        if record.id().is_empty() {
            return Err(Error::InvalidOperation(format!(
                "{} record with an empty id",
                E::KIND
            )));
        }
        self.put(E::key_for(record.id()), record.encode()?)
    }

    fn record_list<E: Entity>(&self) -> Result<Vec<E>> {
        self.scan_kind(E::KIND)?
            .into_iter()
            .map(|(_, bytes)| E::decode(&bytes))
            .collect()
    }
}
