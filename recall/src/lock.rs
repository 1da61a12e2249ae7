//! Lock coordination around recomputation.
//!
//! A `LockGuard` brackets exactly the recomputation call: the store read
//! before it and the store write after it are deliberately uncovered, so
//! concurrent threads may race read-miss-to-write (last write wins).
//! Release is tied to drop, which makes it unconditional across early
//! returns, error propagation, and panics — and it happens if and only if
//! acquisition succeeded.

use recall_core::{Lock, Options, Store, DEFAULT_LOCK_TIMEOUT};

/// RAII bracket around a recomputation.
pub struct LockGuard {
    lock: Option<Box<dyn Lock>>,
    held: bool,
}

impl LockGuard {
    /// Resolve the lock source and attempt acquisition.
    ///
    /// A lock factory in the options takes precedence over the store's
    /// native lock; with neither, the guard is inert. Acquisition timeout
    /// is not an error: the recomputation simply proceeds unlocked, which
    /// allows duplicate concurrent recomputation by design.
    pub fn acquire(key: &str, opts: &Options, store: &dyn Store) -> Self {
        let lock = match &opts.lock {
            Some(factory) => Some(factory(key)),
            None => store.lock(key),
        };

        match lock {
            Some(mut lock) => {
                let timeout = opts.timeout.unwrap_or(DEFAULT_LOCK_TIMEOUT);
                let held = lock.acquire(timeout);
                if !held {
                    tracing::warn!(key, "lock acquisition timed out, recomputing unlocked");
                }
                Self {
                    lock: Some(lock),
                    held,
                }
            }
            None => Self { lock: None, held: false },
        }
    }

    /// Whether the lock was actually obtained.
    pub fn is_held(&self) -> bool {
        self.held
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.held {
            if let Some(lock) = self.lock.as_mut() {
                lock.release();
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
