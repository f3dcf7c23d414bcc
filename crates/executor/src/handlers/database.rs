//! Database-level command handlers.

use tally_engine::Database;

use crate::convert::convert_result;
use crate::types::DatabaseInfo;
use crate::{Output, Result};

/// Handle Ping command.
pub fn ping() -> Result<Output> {
    Ok(Output::Pong {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle Info command.
pub fn info(db: &Database) -> Result<Output> {
    let stats = db.stats();
    Ok(Output::DatabaseInfo(DatabaseInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        durability: stats.durability.to_string(),
        users: stats.users as u64,
        tokens: stats.tokens as u64,
        prizes: stats.prizes as u64,
        commit_version: stats.version,
        wal_bytes: stats.wal_bytes,
        txns_committed: stats.metrics.total_committed,
        txns_aborted: stats.metrics.total_aborted,
    }))
}

/// Handle Flush command.
pub fn flush(db: &Database) -> Result<Output> {
    convert_result(db.flush())?;
    Ok(Output::Unit)
}

/// Handle Compact command.
pub fn compact(db: &Database) -> Result<Output> {
    let stats = convert_result(db.compact())?;
    Ok(Output::Compacted {
        records: stats.records as u64,
        bytes_before: stats.bytes_before,
        bytes_after: stats.bytes_after,
    })
}
