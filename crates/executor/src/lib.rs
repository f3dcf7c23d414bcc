//! # Tally Executor
//!
//! The public API for Tally, an embedded loyalty-points ledger.
//!
//! This is the only crate users need to import. It provides:
//! - [`Tally`] - The main ledger interface with typed methods
//! - [`Command`]/[`Output`] - Low-level command interface (for scripts and pipes)
//! - [`Error`] - Serializable error type
//!
//! ## Quick Start
//!
//! ```text
//! use tally_executor::Tally;
//!
//! let db = Tally::open("/path/to/data")?;
//!
//! let alice = db.create_user("alice", "pw")?;
//! let mug = db.create_prize("mug", 50, 2)?;
//! ```
//!
//! ## Operations
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | **create** | New user (0 points), token, or prize |
//! | **redeem** | Credit a user with a token's points; tokens stay reusable |
//! | **exchange** | Debit a user by a prize's cost and take one unit of stock |
//! | **get / list** | Read users, tokens, prizes |

#![warn(missing_docs)]

mod command;
mod convert;
mod error;
mod executor;
mod output;
mod tally;
mod types;

// Handler modules
mod handlers;

// Test modules
#[cfg(test)]
mod tests;

// =============================================================================
// Public API - Everything users need is re-exported here
// =============================================================================

pub use command::Command;
pub use error::Error;
pub use executor::Executor;
pub use output::Output;
pub use tally::Tally;
pub use types::*;

// Re-export configuration and engine types so users don't need tally-engine directly
pub use tally_engine::{Database, Ledger, TallyConfig};

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
