//! Versioned cache entry record.
//!
//! A `CacheEntry` is the unit of storage: one immutable record per key,
//! replaced wholesale on recomputation. Every entry carries a protocol tag
//! that readers validate before trusting the rest of the record.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EntryError;
use crate::Timestamp;

/// Encoding version written into every entry. Readers that find any other
/// value must treat the entry as incompatible, not as a miss.
pub const PROTOCOL_VERSION: u32 = 1;

/// A single memoized value with its validity metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Encoding tag, always `PROTOCOL_VERSION` for entries written by this
    /// version.
    pub protocol: u32,
    /// When the value was computed.
    pub created_at: Timestamp,
    /// Absolute expiry; `None` means no expiry is set.
    pub expires_at: Option<Timestamp>,
    /// Opaque validity token supplied or computed at write time.
    pub etag: Option<String>,
    /// The memoized result. Opaque to the cache.
    pub value: Value,
}

impl CacheEntry {
    /// Build a fresh entry.
    ///
    /// The stored expiry is the minimum of the explicit `expiry` and
    /// `created_at + max_age`; an unset side is absent rather than a
    /// sentinel that could win the comparison.
    pub fn new(
        value: Value,
        created_at: Timestamp,
        expiry: Option<Timestamp>,
        max_age: Option<Duration>,
        etag: Option<String>,
    ) -> Self {
        // A max_age too large for chrono, or one that overflows the
        // timestamp, is a deadline beyond representable time: no expiry.
        let from_age = max_age.and_then(|age| {
            let age = chrono::Duration::from_std(age).ok()?;
            created_at.checked_add_signed(age)
        });
        let expires_at = match (expiry, from_age) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            protocol: PROTOCOL_VERSION,
            created_at,
            expires_at,
            etag,
            value,
        }
    }

    /// Validate the protocol tag before reading the rest of the record.
    pub fn validate(&self) -> Result<(), EntryError> {
        if self.protocol != PROTOCOL_VERSION {
            return Err(EntryError::protocol_mismatch(self.protocol));
        }
        Ok(())
    }

    /// Copy of this entry with only the expiry field replaced.
    pub fn with_expiry(&self, expires_at: Option<Timestamp>) -> Self {
        Self {
            expires_at,
            ..self.clone()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
