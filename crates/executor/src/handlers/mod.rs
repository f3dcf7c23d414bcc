//! Command handlers organized by category.
//!
//! | Module | Commands | Backing |
//! |--------|----------|---------|
//! | `ledger` | 9 | `Ledger` |
//! | `database` | 4 | `Database` |

pub mod database;
pub mod ledger;
