//! Primitives layer for Tally
//!
//! - **Repository<E>**: typed get / insert / list over one record collection
//!
//! ## Design Principle: Stateless Facades
//!
//! A repository holds only an `Arc<Database>` reference and delegates all
//! operations to the transactional engine. Multiple repositories on the
//! same Database are safe.
//!
//! ## Multi-record Transactions
//!
//! Records of different kinds can be combined within a single transaction
//! through each repository's transactional view, which is built on the
//! `RecordStoreExt` extension trait:
//!
//! ```rust,ignore
//! db.transaction(|txn| {
//!     let mut user = users.require_in(txn, user_id)?;
//!     let mut prize = prizes.require_in(txn, prize_id)?;
//!     prize.exchange(&mut user, now)?;
//!     users.insert_in(txn, &user)?;
//!     prizes.insert_in(txn, &prize)
//! })?;
//! ```

pub mod extensions;
pub mod repository;

pub use extensions::RecordStoreExt;
pub use repository::Repository;
