//! Ledger command handlers.
//!
//! Each handler calls one `Ledger` operation and wraps the record in its
//! output variant.

use tally_core::{NewPrize, NewToken, NewUser};
use tally_engine::Ledger;

use crate::convert::convert_result;
use crate::types::{PrizeInfo, TokenInfo, UserInfo};
use crate::{Output, Result};

/// Handle CreateUser command.
pub fn create_user(ledger: &Ledger, username: String, password: String) -> Result<Output> {
    let user = convert_result(ledger.create_user(NewUser { username, password }))?;
    Ok(Output::User(UserInfo::from(&user)))
}

/// Handle CreateToken command.
pub fn create_token(ledger: &Ledger, name: String, point: u64) -> Result<Output> {
    let token = convert_result(ledger.create_token(NewToken { name, point }))?;
    Ok(Output::Token(TokenInfo::from(&token)))
}

/// Handle CreatePrize command.
pub fn create_prize(ledger: &Ledger, name: String, point: u64, amount: u64) -> Result<Output> {
    let prize = convert_result(ledger.create_prize(NewPrize {
        name,
        point,
        amount,
    }))?;
    Ok(Output::Prize(PrizeInfo::from(&prize)))
}

/// Handle GetUser command.
pub fn get_user(ledger: &Ledger, id: String) -> Result<Output> {
    let user = convert_result(ledger.get_user(&id))?;
    Ok(Output::User(UserInfo::from(&user)))
}

/// Handle ListUsers command.
pub fn list_users(ledger: &Ledger) -> Result<Output> {
    let users = convert_result(ledger.list_users())?;
    Ok(Output::Users(users.iter().map(UserInfo::from).collect()))
}

/// Handle ListTokens command.
pub fn list_tokens(ledger: &Ledger) -> Result<Output> {
    let tokens = convert_result(ledger.list_tokens())?;
    Ok(Output::Tokens(tokens.iter().map(TokenInfo::from).collect()))
}

/// Handle ListPrizes command.
pub fn list_prizes(ledger: &Ledger) -> Result<Output> {
    let prizes = convert_result(ledger.list_prizes())?;
    Ok(Output::Prizes(prizes.iter().map(PrizeInfo::from).collect()))
}

/// Handle RedeemToken command.
pub fn redeem_token(ledger: &Ledger, user_id: String, token_id: String) -> Result<Output> {
    let user = convert_result(ledger.redeem_token(&user_id, &token_id))?;
    Ok(Output::User(UserInfo::from(&user)))
}

/// Handle ExchangePrize command.
pub fn exchange_prize(ledger: &Ledger, user_id: String, prize_id: String) -> Result<Output> {
    let prize = convert_result(ledger.exchange_prize(&user_id, &prize_id))?;
    Ok(Output::Prize(PrizeInfo::from(&prize)))
}
