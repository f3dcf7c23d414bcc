//! Supporting types for outputs.
//!
//! These are the wire views of ledger records. Timestamps are microseconds
//! since Unix epoch. A user's password hash never leaves the engine.

use serde::{Deserialize, Serialize};

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub username: String,
    /// Point balance
    pub points: u64,
    /// Creation time (microseconds)
    pub created_at: u64,
    /// Last balance change (microseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
}

/// Public view of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Redemption code, also the token id
    pub unique_code: String,
    /// Display name
    pub name: String,
    /// Points granted per redemption
    pub point: u64,
    /// Creation time (microseconds)
    pub created_at: u64,
}

/// Public view of a prize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeInfo {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Cost in points per unit
    pub point: u64,
    /// Units left in stock
    pub amount: u64,
    /// Creation time (microseconds)
    pub created_at: u64,
    /// Last exchange (microseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
}

/// Database information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Crate version string
    pub version: String,
    /// `"strict"`, `"batched"`, `"async"` or `"ephemeral"`
    pub durability: String,
    /// Number of users
    pub users: u64,
    /// Number of tokens
    pub tokens: u64,
    /// Number of prizes
    pub prizes: u64,
    /// Latest commit version
    pub commit_version: u64,
    /// Log size in bytes
    pub wal_bytes: u64,
    /// Transactions committed since open
    pub txns_committed: u64,
    /// Transactions aborted since open
    pub txns_aborted: u64,
}
