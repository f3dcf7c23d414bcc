//! Database engine for Tally
//!
//! This crate orchestrates all lower layers:
//! - Database: open/recover, the global write lock, commit through the WAL
//! - Transaction coordination and metrics
//! - Typed record access (`Repository`, `RecordStoreExt`)
//! - Ledger: create, redeem and exchange operations
//!
//! The engine is the only component that knows about cross-layer
//! coordination (storage + WAL + recovery).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod database;
pub mod ledger;
pub mod primitives;

pub use coordinator::{TransactionCoordinator, TransactionMetrics};
pub use database::{CompactionStats, Database, DatabaseStats, TallyConfig, CONFIG_FILE_NAME};
pub use ledger::Ledger;
pub use primitives::{RecordStoreExt, Repository};
