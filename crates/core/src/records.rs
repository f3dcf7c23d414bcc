//! Ledger records and creation payloads
//!
//! Three independent record types live in their own collections:
//!
//! - [`User`]: holds a point balance that never goes negative
//! - [`Token`]: a reusable redemption code worth a fixed number of points
//! - [`Prize`]: costs points and has a finite stock
//!
//! Records are created once and never deleted. Only `points`, `amount` and
//! `updated_at` change after creation.

use crate::error::{Error, Result};
use crate::password;
use crate::timestamp::Timestamp;
use crate::types::{EntityKind, Key};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record type stored in its own collection
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection this record type lives in
    const KIND: EntityKind;

    /// Identifier the record is keyed by
    fn id(&self) -> &str;

    /// Storage key for a record id
    fn key_for(id: &str) -> Key {
        Key::new(Self::KIND, id)
    }

    /// Encode for storage
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from storage
    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

// ============================================================================
// User
// ============================================================================

/// A point-holding account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique, immutable identifier
    pub id: String,
    /// Display name
    pub username: String,
    /// bcrypt hash of the password
    pub password_hash: String,
    /// Point balance
    pub points: u64,
    /// Creation time
    pub created_at: Timestamp,
    /// Time of the last balance change
    pub updated_at: Option<Timestamp>,
}

impl User {
    /// Add `credit` points, failing instead of wrapping on overflow
    pub fn credit(&mut self, credit: u64, at: Timestamp) -> Result<()> {
        self.points = self
            .points
            .checked_add(credit)
            .ok_or(Error::BalanceOverflow {
                points: self.points,
                credit,
            })?;
        self.updated_at = Some(at);
        Ok(())
    }

    /// Check a candidate password against the stored hash
    pub fn verify_password(&self, candidate: &str) -> Result<bool> {
        password::verify_password(candidate, &self.password_hash)
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Token
// ============================================================================

/// A redeemable reward token
///
/// The unique code is both the record key and the code users redeem.
/// Tokens are never consumed: any user can redeem the same token any
/// number of times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Redemption code, also the record key
    pub unique_code: String,
    /// Display name
    pub name: String,
    /// Points granted per redemption
    pub point: u64,
    /// Creation time
    pub created_at: Timestamp,
    /// Always `None`; tokens are never mutated
    pub updated_at: Option<Timestamp>,
}

impl Entity for Token {
    const KIND: EntityKind = EntityKind::Token;

    fn id(&self) -> &str {
        &self.unique_code
    }
}

// ============================================================================
// Prize
// ============================================================================

/// An exchangeable prize with finite stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prize {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Cost in points per unit
    pub point: u64,
    /// Units left in stock
    pub amount: u64,
    /// Creation time
    pub created_at: Timestamp,
    /// Time of the last exchange
    pub updated_at: Option<Timestamp>,
}

impl Prize {
    /// Whether `user` can exchange for one unit right now
    pub fn exchangeable_by(&self, user: &User) -> bool {
        self.point <= user.points && self.amount > 0
    }

    /// Debit the user and take one unit of stock
    ///
    /// Both records are left untouched if the exchange is not allowed.
    pub fn exchange(&mut self, user: &mut User, at: Timestamp) -> Result<()> {
        if !self.exchangeable_by(user) {
            return Err(Error::InsufficientFundsOrStock {
                points: user.points,
                cost: self.point,
                amount: self.amount,
            });
        }
        user.points -= self.point;
        user.updated_at = Some(at);
        self.amount -= 1;
        self.updated_at = Some(at);
        Ok(())
    }
}

impl Entity for Prize {
    const KIND: EntityKind = EntityKind::Prize;

    fn id(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Creation payloads
// ============================================================================

/// Fields required to create a [`User`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name, must be non-empty
    pub username: String,
    /// Plain-text password, must be non-empty; hashed before storage
    pub password: String,
}

impl NewUser {
    /// Check that every required field is present
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.username.is_empty() {
            missing.push("username");
        }
        if self.password.is_empty() {
            missing.push("password");
        }
        check(missing)
    }
}

/// Fields required to create a [`Token`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewToken {
    /// Display name, must be non-empty
    pub name: String,
    /// Points per redemption, must be positive
    pub point: u64,
}

impl NewToken {
    /// Check that every required field is present
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.name.is_empty() {
            missing.push("name");
        }
        if self.point == 0 {
            missing.push("point");
        }
        check(missing)
    }
}

/// Fields required to create a [`Prize`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPrize {
    /// Display name, must be non-empty
    pub name: String,
    /// Cost per unit, must be positive
    pub point: u64,
    /// Initial stock, must be positive
    pub amount: u64,
}

impl NewPrize {
    /// Check that every required field is present
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.name.is_empty() {
            missing.push("name");
        }
        if self.point == 0 {
            missing.push("point");
        }
        if self.amount == 0 {
            missing.push("amount");
        }
        check(missing)
    }
}

fn check(missing: Vec<&'static str>) -> Result<()> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::missing(missing))
    }
}
