//! Output → human/json/raw string formatting.
//!
//! Three modes:
//! - **Human** (default): labelled fields, RFC 3339 timestamps
//! - **JSON** (`--json`): the output payload via `serde_json::to_string_pretty`
//! - **Raw** (`--raw`): bare ids and numbers, one per line, for scripting

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use tally_executor::{DatabaseInfo, Error, Output, PrizeInfo, TokenInfo, UserInfo};

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
    Raw,
}

/// Format a successful output.
pub fn format_output(output: &Output, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => format_json(output),
        OutputMode::Raw => format_raw(output),
        OutputMode::Human => format_human(output),
    }
}

/// Format an error.
pub fn format_error(err: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(&serde_json::json!({
            "error": err.to_string(),
            "detail": err,
        })),
        OutputMode::Raw => err.to_string(),
        OutputMode::Human => format!("(error) {}", err),
    }
}

/// Format a failure that never reached the executor (bad input line).
pub fn format_message_error(msg: &str, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(&serde_json::json!({ "error": msg })),
        OutputMode::Raw => msg.to_string(),
        OutputMode::Human => format!("(error) {}", msg),
    }
}

fn pretty(value: &JsonValue) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

// =========================================================================
// JSON
// =========================================================================

fn format_json(output: &Output) -> String {
    let value = match output {
        Output::Unit => Ok(serde_json::json!({ "ok": true })),
        Output::User(u) => serde_json::to_value(u),
        Output::Users(us) => serde_json::to_value(us),
        Output::Token(t) => serde_json::to_value(t),
        Output::Tokens(ts) => serde_json::to_value(ts),
        Output::Prize(p) => serde_json::to_value(p),
        Output::Prizes(ps) => serde_json::to_value(ps),
        Output::DatabaseInfo(info) => serde_json::to_value(info),
        Output::Pong { version } => Ok(serde_json::json!({ "pong": version })),
        Output::Compacted {
            records,
            bytes_before,
            bytes_after,
        } => Ok(serde_json::json!({
            "records": records,
            "bytes_before": bytes_before,
            "bytes_after": bytes_after,
        })),
    };
    pretty(&value.unwrap_or(JsonValue::Null))
}

// =========================================================================
// Raw
// =========================================================================

fn format_raw(output: &Output) -> String {
    match output {
        Output::Unit => String::new(),
        Output::User(u) => u.id.clone(),
        Output::Users(us) => lines(us.iter().map(|u| u.id.clone())),
        Output::Token(t) => t.unique_code.clone(),
        Output::Tokens(ts) => lines(ts.iter().map(|t| t.unique_code.clone())),
        Output::Prize(p) => p.id.clone(),
        Output::Prizes(ps) => lines(ps.iter().map(|p| p.id.clone())),
        Output::DatabaseInfo(info) => info_lines(info).join("\n"),
        Output::Pong { version } => version.clone(),
        Output::Compacted { records, .. } => records.to_string(),
    }
}

fn lines(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join("\n")
}

// =========================================================================
// Human
// =========================================================================

fn format_human(output: &Output) -> String {
    match output {
        Output::Unit => "OK".to_string(),
        Output::User(u) => user_fields(u).join("\n"),
        Output::Users(us) => numbered(us.iter().map(user_summary)),
        Output::Token(t) => token_fields(t).join("\n"),
        Output::Tokens(ts) => numbered(ts.iter().map(token_summary)),
        Output::Prize(p) => prize_fields(p).join("\n"),
        Output::Prizes(ps) => numbered(ps.iter().map(prize_summary)),
        Output::DatabaseInfo(info) => info_lines(info).join("\n"),
        Output::Pong { version } => format!("PONG {}", version),
        Output::Compacted {
            records,
            bytes_before,
            bytes_after,
        } => format!(
            "compacted {} records ({} -> {} bytes)",
            records, bytes_before, bytes_after
        ),
    }
}

fn numbered(items: impl ExactSizeIterator<Item = String>) -> String {
    if items.len() == 0 {
        return "(empty list)".to_string();
    }
    items
        .enumerate()
        .map(|(i, line)| format!("{}) {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render microseconds since epoch as RFC 3339 (UTC, seconds precision).
pub fn format_timestamp(micros: u64) -> String {
    i64::try_from(micros)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_micros)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| format!("{}us", micros))
}

fn updated(at: Option<u64>) -> String {
    at.map(format_timestamp).unwrap_or_else(|| "never".to_string())
}

fn user_fields(u: &UserInfo) -> Vec<String> {
    vec![
        format!("id:       {}", u.id),
        format!("username: {}", u.username),
        format!("points:   {}", u.points),
        format!("created:  {}", format_timestamp(u.created_at)),
        format!("updated:  {}", updated(u.updated_at)),
    ]
}

fn user_summary(u: &UserInfo) -> String {
    format!("{}  {}  ({} points)", u.id, u.username, u.points)
}

fn token_fields(t: &TokenInfo) -> Vec<String> {
    vec![
        format!("code:    {}", t.unique_code),
        format!("name:    {}", t.name),
        format!("point:   {}", t.point),
        format!("created: {}", format_timestamp(t.created_at)),
    ]
}

fn token_summary(t: &TokenInfo) -> String {
    format!("{}  {}  (+{} points)", t.unique_code, t.name, t.point)
}

fn prize_fields(p: &PrizeInfo) -> Vec<String> {
    vec![
        format!("id:      {}", p.id),
        format!("name:    {}", p.name),
        format!("point:   {}", p.point),
        format!("amount:  {}", p.amount),
        format!("created: {}", format_timestamp(p.created_at)),
        format!("updated: {}", updated(p.updated_at)),
    ]
}

fn prize_summary(p: &PrizeInfo) -> String {
    format!("{}  {}  ({} points, {} left)", p.id, p.name, p.point, p.amount)
}

fn info_lines(info: &DatabaseInfo) -> Vec<String> {
    vec![
        format!("version:        {}", info.version),
        format!("durability:     {}", info.durability),
        format!("users:          {}", info.users),
        format!("tokens:         {}", info.tokens),
        format!("prizes:         {}", info.prizes),
        format!("commit_version: {}", info.commit_version),
        format!("wal_bytes:      {}", info.wal_bytes),
        format!("txns_committed: {}", info.txns_committed),
        format!("txns_aborted:   {}", info.txns_aborted),
    ]
}
