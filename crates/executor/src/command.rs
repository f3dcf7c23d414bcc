//! Command enum defining all Tally operations.
//!
//! Commands are the "instruction set" of the ledger. Every operation that can
//! be performed is represented as a variant of this enum.
//!
//! Commands are:
//! - **Self-contained**: All parameters needed for execution are in the variant
//! - **Serializable**: Can be converted to/from JSON for scripting and pipes
//! - **Pure data**: No closures or executable code

use serde::{Deserialize, Serialize};

/// A command is a self-contained, serializable operation.
///
/// # Command Categories
///
/// | Category | Count | Description |
/// |----------|-------|-------------|
/// | Create | 3 | New users, tokens and prizes |
/// | Read | 4 | Single user lookup, full listings |
/// | Ledger | 2 | Redeem and exchange |
/// | Database | 4 | Ping, info, flush, compact |
///
/// # Example
///
/// ```ignore
/// use tally_executor::Command;
///
/// let cmd = Command::RedeemToken {
///     user_id: "7f9c...".into(),
///     token_id: "a41e...".into(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Command {
    // ==================== Create (3) ====================
    /// Create a user with a zero balance.
    /// Returns: `Output::User`
    CreateUser { username: String, password: String },

    /// Create a token; its id is the redeemable code.
    /// Returns: `Output::Token`
    CreateToken { name: String, point: u64 },

    /// Create a prize with initial stock.
    /// Returns: `Output::Prize`
    CreatePrize {
        name: String,
        point: u64,
        amount: u64,
    },

    // ==================== Read (4) ====================
    /// Look up one user.
    /// Returns: `Output::User`
    GetUser { id: String },

    /// Returns: `Output::Users`
    ListUsers,

    /// Returns: `Output::Tokens`
    ListTokens,

    /// Returns: `Output::Prizes`
    ListPrizes,

    // ==================== Ledger (2) ====================
    /// Credit a user with a token's points.
    /// Returns: `Output::User` (after the credit)
    RedeemToken { user_id: String, token_id: String },

    /// Spend a user's points on one unit of a prize.
    /// Returns: `Output::Prize` (after the exchange)
    ExchangePrize { user_id: String, prize_id: String },

    // ==================== Database (4) ====================
    /// Returns: `Output::Pong`
    Ping,

    /// Returns: `Output::DatabaseInfo`
    Info,

    /// Force committed data to disk.
    /// Returns: `Output::Unit`
    Flush,

    /// Rewrite the log to hold only live records.
    /// Returns: `Output::Compacted`
    Compact,
}

impl Command {
    /// Variant name, used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateUser { .. } => "CreateUser",
            Command::CreateToken { .. } => "CreateToken",
            Command::CreatePrize { .. } => "CreatePrize",
            Command::GetUser { .. } => "GetUser",
            Command::ListUsers => "ListUsers",
            Command::ListTokens => "ListTokens",
            Command::ListPrizes => "ListPrizes",
            Command::RedeemToken { .. } => "RedeemToken",
            Command::ExchangePrize { .. } => "ExchangePrize",
            Command::Ping => "Ping",
            Command::Info => "Info",
            Command::Flush => "Flush",
            Command::Compact => "Compact",
        }
    }

    /// Whether the command can change ledger state
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::CreateUser { .. }
                | Command::CreateToken { .. }
                | Command::CreatePrize { .. }
                | Command::RedeemToken { .. }
                | Command::ExchangePrize { .. }
        )
    }
}
