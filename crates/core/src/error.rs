//! Error types for the ledger
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::EntityKind;
use std::io;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the ledger and its storage
#[derive(Debug, Error)]
pub enum Error {
    /// Required input missing, empty or zero
    #[error("validation failed: missing {}", .fields.join(", "))]
    Validation {
        /// Names of the offending fields, in declaration order
        fields: Vec<&'static str>,
    },

    /// Lookup miss for a user, token or prize
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Collection that was searched
        kind: EntityKind,
        /// Identifier that was not found
        id: String,
    },

    /// Exchange precondition failed: prize costs more than the balance, or is out of stock
    #[error("insufficient points or stock: cost {cost}, balance {points}, stock {amount}")]
    InsufficientFundsOrStock {
        /// User balance at the time of the attempt
        points: u64,
        /// Prize cost
        cost: u64,
        /// Prize stock
        amount: u64,
    },

    /// Crediting a token would overflow the balance
    #[error("balance overflow: {points} + {credit} exceeds u64")]
    BalanceOverflow {
        /// Current balance
        points: u64,
        /// Amount being credited
        credit: u64,
    },

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Data corruption detected
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Buffer ends before a complete WAL entry (partial write)
    #[error("Incomplete entry at offset {offset}: have {have} bytes, need {needed}")]
    IncompleteEntry {
        /// File offset of the entry
        offset: u64,
        /// Bytes available
        have: usize,
        /// Bytes required
        needed: usize,
    },

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of [`Error`] as seen by ledger callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or empty input
    Validation,
    /// Lookup miss
    NotFound,
    /// Exchange rejected
    InsufficientFundsOrStock,
    /// Arithmetic overflow on a balance
    Overflow,
    /// Anything raised by the storage, WAL or configuration layers
    Storage,
}

impl Error {
    /// Validation error for the given fields
    pub fn missing(fields: Vec<&'static str>) -> Self {
        Error::Validation { fields }
    }

    /// Not-found error for a record
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::InsufficientFundsOrStock { .. } => ErrorKind::InsufficientFundsOrStock,
            Error::BalanceOverflow { .. } => ErrorKind::Overflow,
            Error::IoError(_)
            | Error::SerializationError(_)
            | Error::Corruption(_)
            | Error::IncompleteEntry { .. }
            | Error::InvalidOperation(_)
            | Error::StorageError(_)
            | Error::Config(_) => ErrorKind::Storage,
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}
