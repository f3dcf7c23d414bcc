//! Core types and traits for Tally
//!
//! This crate defines the foundational types used throughout the system:
//! - Records: User, Token, Prize and their creation payloads
//! - Key / EntityKind: ordered storage keys, one collection per record type
//! - Error: Error type hierarchy
//! - Timestamp / Clock: record timestamps
//! - IdGenerator: unique record identifiers
//! - Storage: the ordered store contract used by the transaction layer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod password;
pub mod records;
pub mod timestamp;
pub mod traits;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use id::{IdGenerator, SequentialIdGenerator, UuidGenerator};
pub use records::{Entity, NewPrize, NewToken, NewUser, Prize, Token, User};
pub use timestamp::{Clock, ManualClock, SystemClock, Timestamp};
pub use traits::Storage;
pub use types::{EntityKind, Key, VersionedValue};
