//! Conversions from engine types.
//!
//! Maps `tally_core::Error` onto the executor's [`Error`] and ledger
//! records onto their wire views.

use tally_core::{EntityKind, Prize, Token, User};

use crate::types::{PrizeInfo, TokenInfo, UserInfo};
use crate::Error;

/// Convert an engine error to an executor Error.
///
/// Every detail the engine reports is carried over.
impl From<tally_core::Error> for Error {
    fn from(err: tally_core::Error) -> Self {
        use tally_core::Error as E;

        match err {
            E::Validation { fields } => Error::InvalidInput {
                reason: format!("missing {}", fields.join(", ")),
                fields: fields.into_iter().map(String::from).collect(),
            },

            E::NotFound { kind, id } => match kind {
                EntityKind::User => Error::UserNotFound { id },
                EntityKind::Token => Error::TokenNotFound { id },
                EntityKind::Prize => Error::PrizeNotFound { id },
            },

            E::InsufficientFundsOrStock {
                points,
                cost,
                amount,
            } => Error::InsufficientFundsOrStock {
                points,
                cost,
                amount,
            },

            E::BalanceOverflow { points, credit } => Error::Overflow {
                reason: format!("balance {} + {} exceeds u64", points, credit),
            },

            E::IoError(e) => Error::Io {
                reason: e.to_string(),
            },
            E::SerializationError(reason) => Error::Serialization { reason },
            e @ (E::Corruption(_) | E::IncompleteEntry { .. }) => Error::Corruption {
                reason: e.to_string(),
            },
            E::Config(reason) => Error::Config { reason },
            e @ (E::InvalidOperation(_) | E::StorageError(_)) => Error::Internal {
                reason: e.to_string(),
            },
        }
    }
}

/// Convert an engine result, mapping the error.
pub(crate) fn convert_result<T>(r: tally_core::Result<T>) -> crate::Result<T> {
    r.map_err(Error::from)
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        UserInfo {
            id: user.id.clone(),
            username: user.username.clone(),
            points: user.points,
            created_at: user.created_at.as_micros(),
            updated_at: user.updated_at.map(|t| t.as_micros()),
        }
    }
}

impl From<&Token> for TokenInfo {
    fn from(token: &Token) -> Self {
        TokenInfo {
            unique_code: token.unique_code.clone(),
            name: token.name.clone(),
            point: token.point,
            created_at: token.created_at.as_micros(),
        }
    }
}

impl From<&Prize> for PrizeInfo {
    fn from(prize: &Prize) -> Self {
        PrizeInfo {
            id: prize.id.clone(),
            name: prize.name.clone(),
            point: prize.point,
            amount: prize.amount,
            created_at: prize.created_at.as_micros(),
            updated_at: prize.updated_at.map(|t| t.as_micros()),
        }
    }
}
