//! High-level typed wrapper for the Executor.
//!
//! The [`Tally`] struct provides a convenient Rust API that wraps the
//! [`Executor`] and [`Command`]/[`Output`] enums with typed method calls.
//!
//! # Example
//!
//! ```ignore
//! use tally_executor::Tally;
//!
//! let db = Tally::open("/path/to/data")?;
//!
//! let alice = db.create_user("alice", "pw")?;
//! let welcome = db.create_token("welcome", 100)?;
//! let alice = db.redeem_token(&alice.id, &welcome.unique_code)?;
//! assert_eq!(alice.points, 100);
//! ```

use std::path::Path;
use std::sync::Arc;

use tally_engine::{Database, Ledger, TallyConfig};

use crate::convert::convert_result;
use crate::types::*;
use crate::{Command, Error, Executor, Output, Result};

/// High-level typed wrapper for ledger operations.
///
/// Each method:
///
/// 1. Creates the appropriate [`Command`]
/// 2. Executes it via the [`Executor`]
/// 3. Extracts and returns the typed result
#[derive(Debug, Clone)]
pub struct Tally {
    executor: Executor,
}

fn unexpected(cmd: &str) -> Error {
    Error::Internal {
        reason: format!("Unexpected output for {}", cmd),
    }
}

impl Tally {
    /// Open a durable ledger at `path`, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = convert_result(Database::open(path))?;
        Ok(Self::new(db))
    }

    /// Open a durable ledger with an explicit config.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: TallyConfig) -> Result<Self> {
        let db = convert_result(Database::open_with_config(path, config))?;
        Ok(Self::new(db))
    }

    /// Open an in-memory ledger. Nothing is written to disk.
    pub fn cache() -> Self {
        Self::new(Database::ephemeral())
    }

    /// Wrap an already-open database.
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            executor: Executor::new(db),
        }
    }

    /// Wrap a configured ledger (custom clock, id generator, or hash cost).
    pub fn from_ledger(ledger: Ledger) -> Self {
        Self {
            executor: Executor::with_ledger(ledger),
        }
    }

    /// Get the underlying executor.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    // =========================================================================
    // Create (3)
    // =========================================================================

    /// Create a user with a zero balance.
    pub fn create_user(&self, username: &str, password: &str) -> Result<UserInfo> {
        match self.executor.execute(Command::CreateUser {
            username: username.to_string(),
            password: password.to_string(),
        })? {
            Output::User(user) => Ok(user),
            _ => Err(unexpected("CreateUser")),
        }
    }

    /// Create a token worth `point` per redemption.
    pub fn create_token(&self, name: &str, point: u64) -> Result<TokenInfo> {
        match self.executor.execute(Command::CreateToken {
            name: name.to_string(),
            point,
        })? {
            Output::Token(token) => Ok(token),
            _ => Err(unexpected("CreateToken")),
        }
    }

    /// Create a prize costing `point` with `amount` units in stock.
    pub fn create_prize(&self, name: &str, point: u64, amount: u64) -> Result<PrizeInfo> {
        match self.executor.execute(Command::CreatePrize {
            name: name.to_string(),
            point,
            amount,
        })? {
            Output::Prize(prize) => Ok(prize),
            _ => Err(unexpected("CreatePrize")),
        }
    }

    // =========================================================================
    // Read (4)
    // =========================================================================

    /// Look up one user.
    pub fn get_user(&self, id: &str) -> Result<UserInfo> {
        match self.executor.execute(Command::GetUser { id: id.to_string() })? {
            Output::User(user) => Ok(user),
            _ => Err(unexpected("GetUser")),
        }
    }

    /// Every user in ascending id order.
    pub fn list_users(&self) -> Result<Vec<UserInfo>> {
        match self.executor.execute(Command::ListUsers)? {
            Output::Users(users) => Ok(users),
            _ => Err(unexpected("ListUsers")),
        }
    }

    /// Every token in ascending code order.
    pub fn list_tokens(&self) -> Result<Vec<TokenInfo>> {
        match self.executor.execute(Command::ListTokens)? {
            Output::Tokens(tokens) => Ok(tokens),
            _ => Err(unexpected("ListTokens")),
        }
    }

    /// Every prize in ascending id order.
    pub fn list_prizes(&self) -> Result<Vec<PrizeInfo>> {
        match self.executor.execute(Command::ListPrizes)? {
            Output::Prizes(prizes) => Ok(prizes),
            _ => Err(unexpected("ListPrizes")),
        }
    }

    // =========================================================================
    // Ledger (2)
    // =========================================================================

    /// Credit a user with a token's points. Returns the updated user.
    pub fn redeem_token(&self, user_id: &str, token_id: &str) -> Result<UserInfo> {
        match self.executor.execute(Command::RedeemToken {
            user_id: user_id.to_string(),
            token_id: token_id.to_string(),
        })? {
            Output::User(user) => Ok(user),
            _ => Err(unexpected("RedeemToken")),
        }
    }

    /// Spend a user's points on one unit of a prize. Returns the updated prize.
    pub fn exchange_prize(&self, user_id: &str, prize_id: &str) -> Result<PrizeInfo> {
        match self.executor.execute(Command::ExchangePrize {
            user_id: user_id.to_string(),
            prize_id: prize_id.to_string(),
        })? {
            Output::Prize(prize) => Ok(prize),
            _ => Err(unexpected("ExchangePrize")),
        }
    }

    // =========================================================================
    // Database (4)
    // =========================================================================

    /// Ping the database.
    pub fn ping(&self) -> Result<String> {
        match self.executor.execute(Command::Ping)? {
            Output::Pong { version } => Ok(version),
            _ => Err(unexpected("Ping")),
        }
    }

    /// Get database info.
    pub fn info(&self) -> Result<DatabaseInfo> {
        match self.executor.execute(Command::Info)? {
            Output::DatabaseInfo(info) => Ok(info),
            _ => Err(unexpected("Info")),
        }
    }

    /// Flush the database to disk.
    pub fn flush(&self) -> Result<()> {
        match self.executor.execute(Command::Flush)? {
            Output::Unit => Ok(()),
            _ => Err(unexpected("Flush")),
        }
    }

    /// Compact the log. Returns the number of records carried over.
    pub fn compact(&self) -> Result<u64> {
        match self.executor.execute(Command::Compact)? {
            Output::Compacted { records, .. } => Ok(records),
            _ => Err(unexpected("Compact")),
        }
    }
}
