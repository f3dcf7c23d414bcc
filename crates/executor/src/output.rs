//! Output enum for command execution results.
//!
//! Every command produces exactly one output type. This mapping is deterministic:
//! the same command always produces the same output variant (though the values
//! may differ based on ledger state).

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Successful command execution results.
///
/// Each [`Command`](crate::Command) variant maps to exactly one `Output` variant.
///
/// # Example
///
/// ```text
/// use tally_executor::{Command, Output};
///
/// match executor.execute(Command::GetUser { id })? {
///     Output::User(user) => println!("{} has {} points", user.username, user.points),
///     _ => unreachable!("GetUser always returns User"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Output {
    /// No return value (flush)
    Unit,

    // ==================== Records ====================
    /// A single user (create, get, redeem)
    User(UserInfo),

    /// Every user in ascending id order
    Users(Vec<UserInfo>),

    /// A single token (create)
    Token(TokenInfo),

    /// Every token in ascending code order
    Tokens(Vec<TokenInfo>),

    /// A single prize (create, exchange)
    Prize(PrizeInfo),

    /// Every prize in ascending id order
    Prizes(Vec<PrizeInfo>),

    // ==================== Database-specific ====================
    /// Database info
    DatabaseInfo(DatabaseInfo),

    /// Ping response
    Pong {
        /// Crate version string.
        version: String,
    },

    /// Compaction result
    Compacted {
        /// Records carried into the new log.
        records: u64,
        /// Log size before compaction.
        bytes_before: u64,
        /// Log size after compaction.
        bytes_after: u64,
    },
}
