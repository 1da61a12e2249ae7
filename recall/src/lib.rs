//! Recall - Memoization Engine
//!
//! Wraps arbitrary computations with a cache lookup/store cycle over a
//! pluggable key-value backend. The engine is organized around a handful of
//! small pieces:
//!
//! - [`key`]: derives canonical cache keys from a registered signature plus
//!   call arguments.
//! - [`region`]: merges call-site options with a chain of named, inheritable
//!   configuration regions.
//! - [`expiry`]: decides whether a stored entry is still valid for the
//!   effective options.
//! - [`lock`]: serializes recomputation through an injected lock, releasing
//!   on every exit path.
//! - [`memoizer`]: the public operation surface (get/delete/expire/ttl/
//!   etag/exists).
//! - [`wrapper`]: adapts the facade to wrapped callables, including partial
//!   binding for method-style use.
//! - [`memory`]: in-memory reference backend.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use recall::{CallArgs, Memoizer, MemoryStore, Options, Signature};
//!
//! let memo = Arc::new(Memoizer::new(Arc::new(MemoryStore::new()), Options::new()));
//! let double = memo.wrap(Signature::new("demo", "double").param("x"), |args| {
//!     let x = args.positional[0].as_i64().unwrap_or(0);
//!     Ok(serde_json::json!(x * 2))
//! });
//!
//! let args = CallArgs::new().with_arg(21)?;
//! assert_eq!(double.call(args)?, serde_json::json!(42));
//! # Ok::<(), recall::RecallError>(())
//! ```

pub mod expiry;
pub mod key;
pub mod lock;
pub mod memoizer;
pub mod memory;
pub mod region;
pub mod wrapper;

pub use expiry::has_expired;
pub use key::{build_key, master_key, Signature};
pub use lock::LockGuard;
pub use memoizer::Memoizer;
pub use memory::MemoryStore;
pub use region::{RegionMap, DEFAULT_REGION};
pub use wrapper::{ComputeFn, MemoizedFn};

// Re-export the core vocabulary so most users need a single crate.
pub use recall_core::{
    CacheEntry, CallArgs, EntryError, Etagger, KeyError, Lock, LockFactory, Options, RecallError,
    RecallResult, RegionError, Store, StoreError, StoreRef, Timestamp, TtlQuery,
    DEFAULT_LOCK_TIMEOUT, PROTOCOL_VERSION,
};
