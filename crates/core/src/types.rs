//! Storage keys
//!
//! Every record lives under a [`Key`] made of its [`EntityKind`] and its
//! string id. Keys order by kind first, then by id, so a scan over one kind
//! yields records in ascending id order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three record collections kept by the ledger
///
/// The discriminant order is the on-disk and in-memory key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Point-holding user accounts
    User,
    /// Redeemable reward tokens
    Token,
    /// Exchangeable prizes with inventory
    Prize,
}

impl EntityKind {
    /// All kinds in key order
    pub const ALL: [EntityKind; 3] = [EntityKind::User, EntityKind::Token, EntityKind::Prize];

    /// Lowercase name used in messages and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Token => "token",
            EntityKind::Prize => "prize",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite storage key: collection plus record id
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Collection the record belongs to
    pub kind: EntityKind,
    /// Record identifier within the collection
    pub id: String,
}

impl Key {
    /// Create a key
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Smallest possible key of a kind, for range scans
    pub fn first_of(kind: EntityKind) -> Self {
        Self::new(kind, String::new())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Encoded record bytes together with the commit version that wrote them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    /// bincode-encoded record
    pub value: Vec<u8>,
    /// Commit version of the transaction that wrote this value
    pub version: u64,
}
