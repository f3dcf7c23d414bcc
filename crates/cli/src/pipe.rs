//! Pipe mode: one command per stdin line.
//!
//! Lines are split shell-style (`user create "Jane Doe" pw`) and parsed
//! with the same clap tree as shell mode. A line starting with `{` or `"`
//! is read as a JSON-encoded command instead. Blank lines and `#` comments
//! are skipped. A failing line is reported and processing continues.

use std::io::{self, BufRead};

use tally_executor::{Command, Tally};

use crate::commands::build_pipe_cmd;
use crate::format::{format_error, format_message_error, format_output, OutputMode};
use crate::parse::{looks_like_json, matches_to_command, parse_json_command};

/// Run every line from stdin. Returns 1 if any line failed, else 0.
pub fn run_pipe(db: &Tally, mode: OutputMode) -> i32 {
    let stdin = io::stdin();
    let mut exit_code = 0;

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        match parse_line(&line) {
            Ok(None) => continue,
            Ok(Some(cmd)) => {
                if !execute(db, cmd, mode) {
                    exit_code = 1;
                }
            }
            Err(msg) => {
                eprintln!("{}", format_message_error(&msg, mode));
                exit_code = 1;
            }
        }
    }

    exit_code
}

/// Parse one input line. `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    if looks_like_json(trimmed) {
        return parse_json_command(trimmed).map(Some);
    }

    let tokens =
        shlex::split(trimmed).ok_or_else(|| format!("Invalid quoting: {}", trimmed))?;
    if tokens.is_empty() {
        return Ok(None);
    }

    let matches = build_pipe_cmd()
        .try_get_matches_from(tokens)
        .map_err(|e| e.to_string())?;
    matches_to_command(&matches).map(Some)
}

/// Execute and print one command. Returns true on success.
pub fn execute(db: &Tally, cmd: Command, mode: OutputMode) -> bool {
    match db.executor().execute(cmd) {
        Ok(output) => {
            let formatted = format_output(&output, mode);
            if !formatted.is_empty() {
                println!("{}", formatted);
            }
            true
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            false
        }
    }
}
