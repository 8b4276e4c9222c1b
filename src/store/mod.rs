//! Persistent store seam: the keyed-collection interface the core needs, with a
//! SQLite implementation for the tool and an in-memory one for tests/embedding.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::core::error::Result;
use crate::core::models::{PhoneRecord, Reachability, RejectedRecord};
use std::collections::HashSet;

/// Keyed access to the two logical collections (valid numbers, invalid numbers).
///
/// Bulk inserts are unordered and best-effort: a duplicate key is silently
/// skipped, never surfaced as an error, and the returned count covers only the
/// records actually written. Reads used for probing follow the store's natural
/// key order.
pub trait NumberStore: Send + Sync {
    /// Creates collections and unique key constraints if missing.
    fn ensure_indexes(&self) -> Result<()>;

    /// All keys currently in the valid collection.
    fn valid_keys(&self) -> Result<HashSet<String>>;

    /// All keys currently in the invalid collection.
    fn invalid_keys(&self) -> Result<HashSet<String>>;

    /// Unordered bulk insert into the valid collection; duplicates are skipped.
    fn insert_valid(&self, records: &[PhoneRecord]) -> Result<usize>;

    /// Unordered bulk insert into the invalid collection; duplicates are skipped.
    fn insert_invalid(&self, records: &[RejectedRecord]) -> Result<usize>;

    fn count_valid(&self) -> Result<u64>;

    fn count_invalid(&self) -> Result<u64>;

    /// Valid records currently in the given reachability state, in key order.
    fn valid_by_reachability(&self, reachability: Reachability) -> Result<Vec<PhoneRecord>>;

    /// Updates one record's reachability field. Unknown keys are an error.
    fn set_reachability(&self, phone_number: &str, reachability: Reachability) -> Result<()>;
}
