//! Error types for command execution.
//!
//! All errors from command execution are represented by the [`Error`] enum.
//! These errors are:
//! - **Structured**: Each variant has typed fields for error details
//! - **Serializable**: Can be converted to/from JSON
//! - **Lossless**: No error information is lost in conversion from internal errors

use serde::{Deserialize, Serialize};

/// Command execution errors.
///
/// # Categories
///
/// | Category | Variants | Description |
/// |----------|----------|-------------|
/// | Not Found | `UserNotFound`, `TokenNotFound`, `PrizeNotFound` | Record doesn't exist |
/// | Validation | `InvalidInput` | Missing or empty input |
/// | Ledger | `InsufficientFundsOrStock`, `Overflow` | Operation rejected |
/// | System | `Io`, `Serialization`, `Corruption`, `Config`, `Internal` | Storage and infrastructure |
///
/// # Example
///
/// ```ignore
/// use tally_executor::{Command, Error};
///
/// match executor.execute(cmd) {
///     Ok(output) => { /* handle success */ }
///     Err(Error::UserNotFound { id }) => {
///         println!("No user '{}'", id);
///     }
///     Err(e) => {
///         println!("Error: {}", e);
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // ==================== Not Found ====================
    /// User not found
    #[error("user not found: {id}")]
    UserNotFound {
        /// Requested user id
        id: String,
    },

    /// Token not found
    #[error("token not found: {id}")]
    TokenNotFound {
        /// Requested token code
        id: String,
    },

    /// Prize not found
    #[error("prize not found: {id}")]
    PrizeNotFound {
        /// Requested prize id
        id: String,
    },

    // ==================== Validation Errors ====================
    /// Invalid input; `fields` names the missing ones when known
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Human-readable description
        reason: String,
        /// Names of the missing or empty fields
        fields: Vec<String>,
    },

    // ==================== Ledger Errors ====================
    /// Exchange rejected: too few points or no stock left
    #[error("insufficient points or stock: cost {cost}, balance {points}, stock {amount}")]
    InsufficientFundsOrStock {
        /// User's balance at the time of the request
        points: u64,
        /// Prize cost in points
        cost: u64,
        /// Prize stock remaining
        amount: u64,
    },

    /// Numeric overflow
    #[error("overflow: {reason}")]
    Overflow {
        /// What overflowed
        reason: String,
    },

    // ==================== System Errors ====================
    /// I/O error
    #[error("I/O error: {reason}")]
    Io {
        /// Underlying I/O failure
        reason: String,
    },

    /// Serialization error
    #[error("serialization error: {reason}")]
    Serialization {
        /// Encoding or decoding failure
        reason: String,
    },

    /// Stored data failed an integrity check
    #[error("corruption: {reason}")]
    Corruption {
        /// What failed the check
        reason: String,
    },

    /// Invalid configuration
    #[error("config error: {reason}")]
    Config {
        /// Offending setting and why
        reason: String,
    },

    /// Internal error (bug or invariant violation)
    #[error("internal error: {reason}")]
    Internal {
        /// Description of the failure
        reason: String,
    },
}

impl Error {
    /// Whether the error reports a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::UserNotFound { .. } | Error::TokenNotFound { .. } | Error::PrizeNotFound { .. }
        )
    }

    /// Whether the error was raised below the ledger (storage, WAL, config)
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Io { .. }
                | Error::Serialization { .. }
                | Error::Corruption { .. }
                | Error::Config { .. }
                | Error::Internal { .. }
        )
    }
}
