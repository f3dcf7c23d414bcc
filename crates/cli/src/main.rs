//! Tally CLI: command-line front end for the loyalty-points ledger.
//!
//! Two modes:
//! - **Shell mode**: `tally [flags] COMMAND` runs a single command and exits
//! - **Pipe mode**: `cat script | tally` runs one command per stdin line
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `tally=warn`).

mod commands;
mod format;
mod parse;
mod pipe;

use std::io::IsTerminal;
use std::process;

use tally_executor::Tally;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_message_error, OutputMode};
use parse::matches_to_command;

const DEFAULT_DB_PATH: &str = ".tally";

fn main() {
    init_tracing();

    let mut cli = build_cli();
    let matches = cli.clone().get_matches();

    // Determine output mode
    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else if matches.get_flag("raw") {
        OutputMode::Raw
    } else {
        OutputMode::Human
    };

    let has_command = matches.subcommand().is_some();
    if !has_command && std::io::stdin().is_terminal() {
        // Nothing to run and nothing piped in
        let _ = cli.print_help();
        process::exit(2);
    }

    // Open database
    let db = match open_database(&matches) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("{}", format_message_error(&e, output_mode));
            process::exit(1);
        }
    };

    let exit_code = if has_command {
        run_shell_mode(&matches, &db, output_mode)
    } else {
        pipe::run_pipe(&db, output_mode)
    };

    // Drop the database before exiting so the log is synced
    drop(db);
    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tally=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_database(matches: &clap::ArgMatches) -> Result<Tally, String> {
    if matches.get_flag("cache") {
        return Ok(Tally::cache());
    }

    let path = matches
        .get_one::<String>("db")
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_DB_PATH);

    tracing::debug!(target: "tally::cli", path, "Opening database");
    Tally::open(path).map_err(|e| format!("Failed to open database: {}", e))
}

fn run_shell_mode(matches: &clap::ArgMatches, db: &Tally, mode: OutputMode) -> i32 {
    match matches_to_command(matches) {
        Ok(cmd) => {
            if pipe::execute(db, cmd, mode) {
                0
            } else {
                1
            }
        }
        Err(e) => {
            eprintln!("{}", format_message_error(&e, mode));
            1
        }
    }
}
