//! Ledger operations
//!
//! Creation of users, tokens and prizes, plus the two compound operations:
//!
//! - **redeem**: credit a user with a token's point value
//! - **exchange**: debit a user by a prize's cost and take one unit of stock
//!
//! Each compound operation reads both records, checks its precondition and
//! writes both back inside one `Database::transaction`, so no other writer
//! can observe or act on the state between the read and the write-back.
//! A rejected operation writes nothing.

use crate::database::Database;
use crate::primitives::Repository;
use std::sync::Arc;
use tally_concurrency::TransactionContext;
use tally_core::password;
use tally_core::{
    Clock, Entity, Error, IdGenerator, NewPrize, NewToken, NewUser, Prize, Result,
    SystemClock, Token, User, UuidGenerator,
};
use tracing::debug;

/// Attempts to draw an unused id before giving up
const MAX_ID_ATTEMPTS: usize = 16;

/// The loyalty-points ledger
///
/// Holds its collaborators explicitly: one repository per record kind, an
/// id generator and a clock. All three repositories share one database, so
/// a compound operation commits its writes to them together. Cheap to
/// clone; clones share the same database.
#[derive(Clone)]
pub struct Ledger {
    db: Arc<Database>,
    users: Repository<User>,
    tokens: Repository<Token>,
    prizes: Repository<Prize>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    password_cost: u32,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("db", &self.db)
            .field("password_cost", &self.password_cost)
            .finish()
    }
}

impl Ledger {
    /// Ledger with random UUID ids, the system clock, and the database's
    /// configured password cost
    pub fn new(db: Arc<Database>) -> Self {
        let password_cost = db.config().password_cost;
        Self {
            users: Repository::new(db.clone()),
            tokens: Repository::new(db.clone()),
            prizes: Repository::new(db.clone()),
            db,
            ids: Arc::new(UuidGenerator),
            clock: Arc::new(SystemClock),
            password_cost,
        }
    }

    /// Replace the id generator
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Override the bcrypt cost for new users
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    /// The underlying database
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// User collection
    pub fn users(&self) -> &Repository<User> {
        &self.users
    }

    /// Token collection
    pub fn tokens(&self) -> &Repository<Token> {
        &self.tokens
    }

    /// Prize collection
    pub fn prizes(&self) -> &Repository<Prize> {
        &self.prizes
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create a user with a zero balance
    ///
    /// The password is hashed before storage.
    pub fn create_user(&self, payload: NewUser) -> Result<User> {
        payload.validate()?;
        let password_hash = password::hash_password(&payload.password, self.password_cost)?;

        let user = self.db.transaction(|txn| {
            let id = self.fresh_id(&self.users, txn)?;
            let user = User {
                id,
                username: payload.username,
                password_hash,
                points: 0,
                created_at: self.clock.now(),
                updated_at: None,
            };
            self.users.insert_in(txn, &user)?;
            Ok(user)
        })?;

        debug!(target: "tally::ledger", user_id = %user.id, "User created");
        Ok(user)
    }

    /// Create a token; its generated id is the redeemable code
    pub fn create_token(&self, payload: NewToken) -> Result<Token> {
        payload.validate()?;

        let token = self.db.transaction(|txn| {
            let unique_code = self.fresh_id(&self.tokens, txn)?;
            let token = Token {
                unique_code,
                name: payload.name,
                point: payload.point,
                created_at: self.clock.now(),
                updated_at: None,
            };
            self.tokens.insert_in(txn, &token)?;
            Ok(token)
        })?;

        debug!(target: "tally::ledger", code = %token.unique_code, point = token.point, "Token created");
        Ok(token)
    }

    /// Create a prize with its initial stock
    pub fn create_prize(&self, payload: NewPrize) -> Result<Prize> {
        payload.validate()?;

        let prize = self.db.transaction(|txn| {
            let id = self.fresh_id(&self.prizes, txn)?;
            let prize = Prize {
                id,
                name: payload.name,
                point: payload.point,
                amount: payload.amount,
                created_at: self.clock.now(),
                updated_at: None,
            };
            self.prizes.insert_in(txn, &prize)?;
            Ok(prize)
        })?;

        debug!(
            target: "tally::ledger",
            prize_id = %prize.id,
            point = prize.point,
            amount = prize.amount,
            "Prize created"
        );
        Ok(prize)
    }

    fn fresh_id<E: Entity>(
        &self,
        repo: &Repository<E>,
        txn: &TransactionContext,
    ) -> Result<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next_id();
            if !id.is_empty() && !repo.contains_in(txn, &id)? {
                return Ok(id);
            }
        }
        Err(Error::StorageError(format!(
            "no unused {} id after {} attempts",
            E::KIND,
            MAX_ID_ATTEMPTS
        )))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Look up one user
    pub fn get_user(&self, id: &str) -> Result<User> {
        self.users
            .get(id)?
            .ok_or_else(|| Error::not_found(User::KIND, id))
    }

    /// Every user in ascending id order
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.users.list()
    }

    /// Every token in ascending code order
    pub fn list_tokens(&self) -> Result<Vec<Token>> {
        self.tokens.list()
    }

    /// Every prize in ascending id order
    pub fn list_prizes(&self) -> Result<Vec<Prize>> {
        self.prizes.list()
    }

    // ========================================================================
    // Compound operations
    // ========================================================================

    /// Credit a user with a token's point value
    ///
    /// The user is looked up before the token. The token is left unchanged
    /// and can be redeemed again by anyone.
    ///
    /// # Errors
    ///
    /// - `Validation` when either id is empty
    /// - `NotFound` for the first missing record
    /// - `BalanceOverflow` when the new balance does not fit in a `u64`
    pub fn redeem_token(&self, user_id: &str, token_id: &str) -> Result<User> {
        require_ids(&[("user_id", user_id), ("token_id", token_id)])?;

        let user = self.db.transaction(|txn| {
            let mut user = self.users.require_in(txn, user_id)?;
            let token = self.tokens.require_in(txn, token_id)?;

            user.credit(token.point, self.clock.now())?;
            self.users.insert_in(txn, &user)?;
            Ok(user)
        })?;

        debug!(
            target: "tally::ledger",
            user_id,
            token_id,
            points = user.points,
            "Token redeemed"
        );
        Ok(user)
    }

    /// Exchange a user's points for one unit of a prize
    ///
    /// Fails without changing either record when the prize costs more than
    /// the user's balance or is out of stock.
    ///
    /// # Errors
    ///
    /// - `Validation` when either id is empty
    /// - `NotFound` for the first missing record (user before prize)
    /// - `InsufficientFundsOrStock` when the guard fails
    pub fn exchange_prize(&self, user_id: &str, prize_id: &str) -> Result<Prize> {
        require_ids(&[("user_id", user_id), ("prize_id", prize_id)])?;

        let prize = self.db.transaction(|txn| {
            let mut user = self.users.require_in(txn, user_id)?;
            let mut prize = self.prizes.require_in(txn, prize_id)?;

            prize.exchange(&mut user, self.clock.now())?;
            self.users.insert_in(txn, &user)?;
            self.prizes.insert_in(txn, &prize)?;
            Ok(prize)
        })?;

        debug!(
            target: "tally::ledger",
            user_id,
            prize_id,
            remaining = prize.amount,
            "Prize exchanged"
        );
        Ok(prize)
    }
}

fn require_ids(ids: &[(&'static str, &str)]) -> Result<()> {
    let missing: Vec<&'static str> = ids
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::missing(missing))
    }
}
