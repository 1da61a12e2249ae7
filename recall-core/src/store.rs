//! Store and lock capability traits.
//!
//! The cache is storage-agnostic: any key-value backend that can hold
//! `CacheEntry` records per string key conforms. Backends may additionally
//! expose a native lock or TTL query; both are optional capabilities with
//! conservative defaults.

use std::time::Duration;

use crate::entry::CacheEntry;
use crate::error::StoreError;

/// Mutual-exclusion primitive scoped to one cache key.
///
/// Implementations decide what exclusion means (thread mutex, file lock,
/// remote lease). `acquire` blocks the calling thread up to `timeout` and
/// reports whether the lock was obtained; the engine calls `release` only
/// after a successful `acquire`.
pub trait Lock: Send {
    /// Try to take the lock, blocking up to `timeout`.
    fn acquire(&mut self, timeout: Duration) -> bool;

    /// Give the lock back.
    fn release(&mut self);
}

/// Outcome of a native TTL query.
///
/// `Unsupported` makes the engine fall back to computing the TTL from the
/// stored expiry; `Known` is the backend's own answer, where `None` means
/// the key has no expiry (or no entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TtlQuery {
    /// The backend has no native TTL support.
    Unsupported,
    /// The backend's answer for the key.
    Known(Option<Duration>),
}

/// Key-value backend holding cache entries.
///
/// Implementations must be thread-safe; the engine only requires atomic
/// single-key get/set/delete and makes no transactional assumptions across
/// keys or across a read-then-write sequence.
pub trait Store: Send + Sync {
    /// Fetch the entry for a key, if any.
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Write the entry for a key, replacing any previous record.
    fn set(&self, key: &str, entry: CacheEntry) -> Result<(), StoreError>;

    /// Remove the entry for a key. Absent keys are `StoreError::NotFound`;
    /// the facade decides whether that matters.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Native lock for a key, if the backend offers one. A lock supplied in
    /// the call options takes precedence over this.
    fn lock(&self, _key: &str) -> Option<Box<dyn Lock>> {
        None
    }

    /// Native TTL query, if the backend offers one.
    fn ttl(&self, _key: &str) -> TtlQuery {
        TtlQuery::Unsupported
    }
}
