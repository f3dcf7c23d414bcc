//! The Executor - single entry point to the ledger engine.
//!
//! The Executor is a stateless dispatcher that routes commands to the
//! appropriate ledger or database operation and converts results to outputs.

use std::sync::Arc;

use tally_engine::{Database, Ledger};
use tracing::debug;

use crate::handlers;
use crate::{Command, Output, Result};

/// The command executor - single entry point to the ledger engine.
///
/// The Executor is **stateless**: it holds a ledger over a shared database
/// but maintains no state of its own. All state lives in the engine.
///
/// # Thread Safety
///
/// Executor is `Send + Sync` and can be shared across threads.
///
/// # Example
///
/// ```ignore
/// use tally_executor::{Command, Executor};
///
/// let executor = Executor::new(db);
///
/// // Single command execution
/// let result = executor.execute(Command::CreateToken {
///     name: "welcome".into(),
///     point: 100,
/// })?;
///
/// // Batch execution
/// let results = executor.execute_many(vec![Command::ListUsers, Command::ListPrizes]);
/// ```
#[derive(Debug, Clone)]
pub struct Executor {
    ledger: Ledger,
}

impl Executor {
    /// Create a new executor over a database, using the default ledger setup.
    pub fn new(db: Arc<Database>) -> Self {
        Self::with_ledger(Ledger::new(db))
    }

    /// Create a new executor around a configured ledger.
    pub fn with_ledger(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// The ledger commands run against.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The underlying database.
    pub fn database(&self) -> &Arc<Database> {
        self.ledger.database()
    }

    /// Execute a single command.
    ///
    /// Returns the command result or an error.
    pub fn execute(&self, cmd: Command) -> Result<Output> {
        let name = cmd.name();
        debug!(target: "tally::executor", command = name, "Executing");

        let result = match cmd {
            // Create
            Command::CreateUser { username, password } => {
                handlers::ledger::create_user(&self.ledger, username, password)
            }
            Command::CreateToken { name, point } => {
                handlers::ledger::create_token(&self.ledger, name, point)
            }
            Command::CreatePrize {
                name,
                point,
                amount,
            } => handlers::ledger::create_prize(&self.ledger, name, point, amount),

            // Read
            Command::GetUser { id } => handlers::ledger::get_user(&self.ledger, id),
            Command::ListUsers => handlers::ledger::list_users(&self.ledger),
            Command::ListTokens => handlers::ledger::list_tokens(&self.ledger),
            Command::ListPrizes => handlers::ledger::list_prizes(&self.ledger),

            // Ledger
            Command::RedeemToken { user_id, token_id } => {
                handlers::ledger::redeem_token(&self.ledger, user_id, token_id)
            }
            Command::ExchangePrize { user_id, prize_id } => {
                handlers::ledger::exchange_prize(&self.ledger, user_id, prize_id)
            }

            // Database
            Command::Ping => handlers::database::ping(),
            Command::Info => handlers::database::info(self.database()),
            Command::Flush => handlers::database::flush(self.database()),
            Command::Compact => handlers::database::compact(self.database()),
        };

        if let Err(e) = &result {
            debug!(target: "tally::executor", command = name, error = %e, "Command failed");
        }
        result
    }

    /// Execute multiple commands in order.
    ///
    /// Each command runs independently; a failure does not stop the ones
    /// after it. Returns one result per command, in the same order.
    pub fn execute_many(&self, cmds: Vec<Command>) -> Vec<Result<Output>> {
        cmds.into_iter().map(|cmd| self.execute(cmd)).collect()
    }
}
