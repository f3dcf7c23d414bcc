//! Storage layer for Tally
//!
//! This crate implements the in-memory half of the durable collection:
//! - UnifiedStore: BTreeMap-based ordered storage with RwLock
//! - Version tracking with AtomicU64
//!
//! Persistence is the durability crate's job: every batch applied here has
//! already been written to the WAL, and the store is rebuilt from the WAL on
//! open.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod unified;

pub use unified::UnifiedStore;
