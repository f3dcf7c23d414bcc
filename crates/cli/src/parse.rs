//! ArgMatches → Command conversion.
//!
//! Translates clap's parsed arguments into an executor [`Command`]. Pipe
//! mode also accepts a line of JSON holding a serialized `Command`.

use clap::ArgMatches;
use tally_executor::Command;

/// Convert clap ArgMatches into a Command.
pub fn matches_to_command(matches: &ArgMatches) -> Result<Command, String> {
    let (sub_name, sub_matches) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    match sub_name {
        "user" => parse_user(sub_matches),
        "token" => parse_token(sub_matches),
        "prize" => parse_prize(sub_matches),
        "redeem" => Ok(Command::RedeemToken {
            user_id: string_arg(sub_matches, "user")?,
            token_id: string_arg(sub_matches, "token")?,
        }),
        "exchange" => Ok(Command::ExchangePrize {
            user_id: string_arg(sub_matches, "user")?,
            prize_id: string_arg(sub_matches, "prize")?,
        }),
        "ping" => Ok(Command::Ping),
        "info" => Ok(Command::Info),
        "flush" => Ok(Command::Flush),
        "compact" => Ok(Command::Compact),
        other => Err(format!("Unknown command: {}", other)),
    }
}

/// Parse a JSON-encoded command, e.g. `{"GetUser":{"id":"..."}}`.
pub fn parse_json_command(line: &str) -> Result<Command, String> {
    serde_json::from_str(line).map_err(|e| format!("Invalid JSON command: {}", e))
}

/// Whether a pipe line should be read as JSON rather than shell words.
pub fn looks_like_json(line: &str) -> bool {
    line.starts_with('{') || line.starts_with('"')
}

fn parse_user(matches: &ArgMatches) -> Result<Command, String> {
    match matches.subcommand() {
        Some(("create", m)) => Ok(Command::CreateUser {
            username: string_arg(m, "username")?,
            password: string_arg(m, "password")?,
        }),
        Some(("get", m)) => Ok(Command::GetUser {
            id: string_arg(m, "id")?,
        }),
        Some(("list", _)) => Ok(Command::ListUsers),
        _ => Err("Unknown user subcommand".to_string()),
    }
}

fn parse_token(matches: &ArgMatches) -> Result<Command, String> {
    match matches.subcommand() {
        Some(("create", m)) => Ok(Command::CreateToken {
            name: string_arg(m, "name")?,
            point: u64_arg(m, "point")?,
        }),
        Some(("list", _)) => Ok(Command::ListTokens),
        _ => Err("Unknown token subcommand".to_string()),
    }
}

fn parse_prize(matches: &ArgMatches) -> Result<Command, String> {
    match matches.subcommand() {
        Some(("create", m)) => Ok(Command::CreatePrize {
            name: string_arg(m, "name")?,
            point: u64_arg(m, "point")?,
            amount: u64_arg(m, "amount")?,
        }),
        Some(("list", _)) => Ok(Command::ListPrizes),
        _ => Err("Unknown prize subcommand".to_string()),
    }
}

fn string_arg(m: &ArgMatches, name: &str) -> Result<String, String> {
    m.get_one::<String>(name)
        .cloned()
        .ok_or_else(|| format!("Missing argument: {}", name))
}

fn u64_arg(m: &ArgMatches, name: &str) -> Result<u64, String> {
    m.get_one::<u64>(name)
        .copied()
        .ok_or_else(|| format!("Missing argument: {}", name))
}
