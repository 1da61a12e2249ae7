//! Error types for recall operations

use thiserror::Error;

use crate::entry::PROTOCOL_VERSION;

/// Store backend errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("No entry for key {key:?}")]
    NotFound { key: String },

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Backend failure: {reason}")]
    Backend { reason: String },
}

/// Entry codec errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntryError {
    /// A stored entry carries an encoding this version cannot read. This is
    /// a contract violation (corrupted or incompatible data), never a miss.
    #[error("Incompatible entry protocol {found}, expected {expected}")]
    ProtocolMismatch { found: u32, expected: u32 },
}

impl EntryError {
    /// Build a mismatch error against the current protocol version.
    pub fn protocol_mismatch(found: u32) -> Self {
        EntryError::ProtocolMismatch {
            found,
            expected: PROTOCOL_VERSION,
        }
    }
}

/// Region configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegionError {
    /// A `region` option or `parent` link names a region that was never
    /// configured. Distinct from a cycle.
    #[error("Unknown region {name:?}")]
    Unknown { name: String },

    /// The parent chain revisits a region (or exceeds the depth cap)
    /// without reaching \"default\".
    #[error("Region chain starting at {name:?} never reaches \"default\"")]
    Cycle { name: String },

    /// The fully merged options carry no store. Cannot happen for chains
    /// ending in a default region built by `Memoizer::new`.
    #[error("No store resolved for region chain starting at {name:?}")]
    NoStore { name: String },
}

/// Key derivation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("Argument {name:?} cannot be rendered into a key: {reason}")]
    Unrenderable { name: String, reason: String },
}

/// Master error type for all recall operations.
#[derive(Debug, Error)]
pub enum RecallError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Entry error: {0}")]
    Entry(#[from] EntryError),

    #[error("Region error: {0}")]
    Region(#[from] RegionError),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    /// A wrapped computation failed. The source error is carried unchanged;
    /// nothing was written to the store.
    #[error("Computation failed: {0}")]
    Compute(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RecallError {
    /// Wrap a computation failure.
    pub fn compute<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RecallError::Compute(Box::new(err))
    }
}

/// Result type alias for recall operations.
pub type RecallResult<T> = Result<T, RecallError>;

// =============================================================================
// TESTS
// =============================================================================
