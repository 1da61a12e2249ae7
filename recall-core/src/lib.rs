//! Recall Core - Data Types and Capability Traits
//!
//! Pure data structures and trait definitions with no engine behavior.
//! The memoization engine in the `recall` crate depends on this.

use std::time::Duration;

use chrono::{DateTime, Utc};

pub mod args;
pub mod entry;
pub mod error;
pub mod options;
pub mod store;

pub use args::CallArgs;
pub use entry::{CacheEntry, PROTOCOL_VERSION};
pub use error::{EntryError, KeyError, RecallError, RecallResult, RegionError, StoreError};
pub use options::{Etagger, LockFactory, Options, StoreRef};
pub use store::{Lock, Store, TtlQuery};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// How long a recomputation waits on its lock when no timeout option is set.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);
