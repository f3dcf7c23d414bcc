//! Tally - embedded loyalty-points ledger
//!
//! Users collect points by redeeming tokens and spend them on prizes with
//! finite stock. Every operation is durable and atomic: a redeem or an
//! exchange either writes all of its records or none of them, including
//! across a crash.
//!
//! # Quick Start
//!
//! ```ignore
//! use tally::Tally;
//!
//! // Create an in-memory ledger
//! let db = Tally::cache();
//!
//! let alice = db.create_user("alice", "pw")?;
//! let welcome = db.create_token("welcome", 100)?;
//! db.redeem_token(&alice.id, &welcome.unique_code)?;
//! ```
//!
//! # Architecture
//!
//! All operations go through the [`Executor`] which provides a command-based API.
//! The [`Tally`] struct provides a convenient high-level interface.
//!
//! Internal implementation details (storage, concurrency, durability, engine)
//! are not exposed - only the executor API is public.

// Re-export the public API from tally-executor
pub use tally_executor::*;
