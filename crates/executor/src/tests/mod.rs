//! Test modules for the executor crate.

pub mod tally_api;

use crate::{Executor, Tally};
use std::sync::Arc;
use tally_core::password::MIN_COST;
use tally_core::SequentialIdGenerator;
use tally_engine::{Database, Ledger};

/// Ledger over a fresh in-memory database with cheap hashing and
/// predictable ids.
pub(crate) fn test_ledger() -> Ledger {
    Ledger::new(Database::ephemeral())
        .with_id_generator(Arc::new(SequentialIdGenerator::new("id")))
        .with_password_cost(MIN_COST)
}

pub(crate) fn test_executor() -> Executor {
    Executor::with_ledger(test_ledger())
}

pub(crate) fn test_tally() -> Tally {
    Tally::from_ledger(test_ledger())
}
