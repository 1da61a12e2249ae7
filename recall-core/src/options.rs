//! Option bundles for calls and regions.
//!
//! One typed bundle serves both roles: region configuration and call-site
//! overrides. Resolution merges bundles with first-set-wins semantics, so
//! the most specific source of each field decides it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::args::CallArgs;
use crate::store::{Lock, Store};
use crate::Timestamp;

/// Shared handle to a store backend.
pub type StoreRef = Arc<dyn Store>;

/// Constructor for a key-scoped lock.
pub type LockFactory = Arc<dyn Fn(&str) -> Box<dyn Lock> + Send + Sync>;

/// Dynamic etag computed from the call arguments when no static etag is set.
pub type Etagger = Arc<dyn Fn(&CallArgs) -> String + Send + Sync>;

/// A bundle of caching options. Every field is optional; an unset field
/// defers to the next source in the region chain.
#[derive(Clone, Default)]
pub struct Options {
    /// Region to start resolution in. Defaults to `"default"`.
    pub region: Option<String>,
    /// Region to inherit unset fields from. Only meaningful on region
    /// configuration; defaults to `"default"`.
    pub parent: Option<String>,
    /// Key prefix. The outer level tracks whether the field was set at all:
    /// `Some(None)` is an explicit "no prefix" that shadows an inherited
    /// namespace, while `None` defers to the chain.
    pub namespace: Option<Option<String>>,
    /// Backend for this region or call.
    pub store: Option<StoreRef>,
    /// Lock constructor. Takes precedence over the store's native lock.
    pub lock: Option<LockFactory>,
    /// Absolute expiry applied at write time. At read time an already-past
    /// expiry forcibly invalidates any entry.
    pub expiry: Option<Timestamp>,
    /// Relative expiry measured from the entry's creation time.
    pub max_age: Option<Duration>,
    /// Expected validity token; a stored entry with a different etag is
    /// treated as expired.
    pub etag: Option<String>,
    /// Fallback producing an etag from the call arguments when `etag` is
    /// unset.
    pub etagger: Option<Etagger>,
    /// Lock acquisition timeout.
    pub timeout: Option<Duration>,
}

impl Options {
    /// Empty bundle with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the starting region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the parent region to inherit from.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Prefix keys with `namespace:`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(Some(namespace.into()));
        self
    }

    /// Explicitly disable any inherited namespace, reaching the raw key.
    pub fn without_namespace(mut self) -> Self {
        self.namespace = Some(None);
        self
    }

    /// Set the backend store.
    pub fn with_store(mut self, store: StoreRef) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the lock constructor.
    pub fn with_lock(mut self, lock: LockFactory) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Set an absolute expiry.
    pub fn with_expiry(mut self, expiry: Timestamp) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Set a relative expiry from creation time.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Set the expected etag.
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Set the dynamic etag producer.
    pub fn with_etagger(mut self, etagger: Etagger) -> Self {
        self.etagger = Some(etagger);
        self
    }

    /// Set the lock acquisition timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fill unset fields from a lower-precedence source. Fields already set
    /// here are never overwritten.
    pub fn merge_from(&mut self, other: &Options) {
        if self.region.is_none() {
            self.region = other.region.clone();
        }
        if self.parent.is_none() {
            self.parent = other.parent.clone();
        }
        if self.namespace.is_none() {
            self.namespace = other.namespace.clone();
        }
        if self.store.is_none() {
            self.store = other.store.clone();
        }
        if self.lock.is_none() {
            self.lock = other.lock.clone();
        }
        if self.expiry.is_none() {
            self.expiry = other.expiry;
        }
        if self.max_age.is_none() {
            self.max_age = other.max_age;
        }
        if self.etag.is_none() {
            self.etag = other.etag.clone();
        }
        if self.etagger.is_none() {
            self.etagger = other.etagger.clone();
        }
        if self.timeout.is_none() {
            self.timeout = other.timeout;
        }
    }

    /// The namespace that actually applies: set, non-empty, not explicitly
    /// disabled.
    pub fn effective_namespace(&self) -> Option<&str> {
        self.namespace
            .as_ref()
            .and_then(|ns| ns.as_deref())
            .filter(|ns| !ns.is_empty())
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("region", &self.region)
            .field("parent", &self.parent)
            .field("namespace", &self.namespace)
            .field("store", &self.store.as_ref().map(|_| "<store>"))
            .field("lock", &self.lock.as_ref().map(|_| "<lock factory>"))
            .field("expiry", &self.expiry)
            .field("max_age", &self.max_age)
            .field("etag", &self.etag)
            .field("etagger", &self.etagger.as_ref().map(|_| "<etagger>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
