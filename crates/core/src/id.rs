//! Record identifier generation
//!
//! New users, tokens and prizes get their key from an [`IdGenerator`].
//! Production code uses random v4 UUIDs; tests can swap in a
//! [`SequentialIdGenerator`] to get predictable, ordered ids.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Produces collision-free string identifiers
pub trait IdGenerator: Send + Sync {
    /// Generate a fresh identifier
    fn next_id(&self) -> String;
}

/// Random v4 UUID identifiers (hyphenated, lowercase)
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Monotonic identifiers of the form `<prefix>-000001`
///
/// Zero-padded so that lexicographic key order matches creation order.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Create a generator starting at 1
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{:06}", self.prefix, n)
    }
}
