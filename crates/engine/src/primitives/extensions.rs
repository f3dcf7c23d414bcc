//! Transaction extension traits for record operations
//!
//! Extension traits let several record kinds participate in one
//! transaction. The implementation for `TransactionContext` lives in
//! `repository.rs` beside the standalone [`Repository`](super::Repository)
//! API, and both share the same encoding.

use tally_core::{Entity, Result};

/// Typed record operations within a transaction
///
/// Implemented in `repository.rs`
pub trait RecordStoreExt {
    /// Read a record by id, seeing the transaction's own writes
    fn record_get<E: Entity>(&self, id: &str) -> Result<Option<E>>;

    /// Whether a record with this id exists
    fn record_exists<E: Entity>(&self, id: &str) -> Result<bool>;

    /// Buffer a record write (insert or overwrite) keyed by its id
    fn record_put<E: Entity>(&mut self, record: &E) -> Result<()>;

    /// Every record of the kind, in ascending id order
    fn record_list<E: Entity>(&self) -> Result<Vec<E>>;
}
