//! Durability layer for Tally
//!
//! This crate handles everything that touches disk:
//!
//! - WAL: append-only log with one `BeginTxn .. CommitTxn` group per committed transaction
//! - Durability modes: Strict, Batched (default), Async
//! - Entry framing with CRC32 checksums
//! - Recovery: replay of committed transactions into a `Storage`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod recovery;
pub mod wal;

pub use recovery::{replay_entries, replay_wal, ReplayStats};
pub use wal::{DurabilityMode, WalScan, WALEntry, WAL};
