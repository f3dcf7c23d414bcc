//! Concurrency layer for Tally
//!
//! Transactions are serialized: one writer at a time holds the commit lock
//! for the whole read-modify-write, so no conflict detection is needed.
//!
//! - TransactionContext: buffered writes with read-your-writes
//! - TransactionManager: commit lock, version and txn id allocation, commit protocol
//! - TransactionWALWriter: WAL entries for one transaction
//! - RecoveryCoordinator: rebuilds storage and manager from the WAL

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod recovery;
pub mod transaction;
pub mod wal_writer;

pub use manager::TransactionManager;
pub use recovery::{RecoveryCoordinator, RecoveryResult, RecoveryStats};
pub use transaction::{TransactionContext, TransactionStatus};
pub use wal_writer::TransactionWALWriter;
