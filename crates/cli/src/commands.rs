//! Clap command tree definition.
//!
//! Builds the full `clap::Command` tree used by both shell mode (directly)
//! and pipe mode (via `try_get_matches_from`).

use clap::{value_parser, Arg, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("tally")
        .about("Loyalty-points ledger: users, tokens and prizes")
        .subcommand_required(false)
        .arg(
            Arg::new("db")
                .long("db")
                .help("Database path (default: .tally)")
                .global(true),
        )
        .arg(
            Arg::new("cache")
                .long("cache")
                .help("Ephemeral in-memory database, no disk")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("db")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("raw")
                .global(true),
        )
        .arg(
            Arg::new("raw")
                .long("raw")
                .help("Raw output mode (bare ids and numbers)")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommands(ledger_subcommands())
}

/// Build a command tree for pipe mode (no global flags).
pub fn build_pipe_cmd() -> Command {
    Command::new("pipe")
        .multicall(true)
        .subcommand_required(true)
        .subcommands(ledger_subcommands())
}

fn ledger_subcommands() -> Vec<Command> {
    vec![
        build_user(),
        build_token(),
        build_prize(),
        build_redeem(),
        build_exchange(),
        build_ping(),
        build_info(),
        build_flush(),
        build_compact(),
    ]
}

fn points_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .value_parser(value_parser!(u64))
        .help(help)
}

// =========================================================================
// Records
// =========================================================================

fn build_user() -> Command {
    Command::new("user")
        .about("User operations")
        .subcommand_required(true)
        .subcommand(
            Command::new("create")
                .about("Create a user with zero points")
                .arg(Arg::new("username").required(true).help("Display name"))
                .arg(Arg::new("password").required(true).help("Password (stored hashed)")),
        )
        .subcommand(
            Command::new("get")
                .about("Show one user")
                .arg(Arg::new("id").required(true).help("User id")),
        )
        .subcommand(Command::new("list").about("List all users"))
}

fn build_token() -> Command {
    Command::new("token")
        .about("Token operations")
        .subcommand_required(true)
        .subcommand(
            Command::new("create")
                .about("Create a token; its id is the redeem code")
                .arg(Arg::new("name").required(true).help("Display name"))
                .arg(points_arg("point", "Points granted per redemption")),
        )
        .subcommand(Command::new("list").about("List all tokens"))
}

fn build_prize() -> Command {
    Command::new("prize")
        .about("Prize operations")
        .subcommand_required(true)
        .subcommand(
            Command::new("create")
                .about("Create a prize with initial stock")
                .arg(Arg::new("name").required(true).help("Display name"))
                .arg(points_arg("point", "Cost in points per unit"))
                .arg(points_arg("amount", "Units in stock")),
        )
        .subcommand(Command::new("list").about("List all prizes"))
}

// =========================================================================
// Ledger
// =========================================================================

fn build_redeem() -> Command {
    Command::new("redeem")
        .about("Credit a user with a token's points")
        .arg(Arg::new("user").required(true).help("User id"))
        .arg(Arg::new("token").required(true).help("Token code"))
}

fn build_exchange() -> Command {
    Command::new("exchange")
        .about("Spend a user's points on one unit of a prize")
        .arg(Arg::new("user").required(true).help("User id"))
        .arg(Arg::new("prize").required(true).help("Prize id"))
}

// =========================================================================
// Database
// =========================================================================

fn build_ping() -> Command {
    Command::new("ping").about("Ping the database")
}

fn build_info() -> Command {
    Command::new("info").about("Get database information")
}

fn build_flush() -> Command {
    Command::new("flush").about("Flush pending writes to disk")
}

fn build_compact() -> Command {
    Command::new("compact").about("Rewrite the log to hold only live records")
}
