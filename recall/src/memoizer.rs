//! The memoizer facade.
//!
//! Every operation follows the same first step: merge the call-site options
//! through the region chain, producing the effective options, the final
//! (possibly namespaced) key, and the target store. What happens after that
//! is operation-specific and kept deliberately small.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;

use recall_core::{
    CacheEntry, CallArgs, Options, RecallResult, StoreError, StoreRef, Timestamp, TtlQuery,
};

use crate::expiry::has_expired;
use crate::key::{master_key, Signature};
use crate::lock::LockGuard;
use crate::region::RegionMap;
use crate::wrapper::{ComputeFn, MemoizedFn};

/// Cache and memoizer over a pluggable store.
///
/// Shared via `Arc` so wrapped functions can hold onto it. Regions may be
/// added after construction; the `"default"` region always carries the
/// store given at construction.
pub struct Memoizer {
    regions: RwLock<RegionMap>,
}

impl Memoizer {
    /// Create a memoizer whose `"default"` region is `options` pinned to
    /// `store`.
    pub fn new(store: StoreRef, options: Options) -> Self {
        Self {
            regions: RwLock::new(RegionMap::new(options.with_store(store))),
        }
    }

    /// Add or replace a named configuration region.
    pub fn add_region(&self, name: impl Into<String>, options: Options) {
        self.regions.write().insert(name, options);
    }

    /// Resolve the region chain for one call.
    fn resolve(&self, key: &str, opts: &mut Options) -> RecallResult<(String, StoreRef)> {
        Ok(self.regions.read().resolve(key, opts)?)
    }

    /// Read an entry and check validity; expired and absent look the same.
    fn read_valid(&self, key: &str, store: &StoreRef, opts: &Options) -> RecallResult<Option<Value>> {
        match store.get(key)? {
            Some(entry) => {
                entry.validate()?;
                if has_expired(&entry, opts, Utc::now()) {
                    tracing::debug!(key, "cached entry expired");
                    Ok(None)
                } else {
                    tracing::trace!(key, "cache hit");
                    Ok(Some(entry.value))
                }
            }
            None => Ok(None),
        }
    }

    /// Retrieve a cached value without any way to recompute it.
    ///
    /// `Ok(None)` covers both "nothing stored" and "stored but expired
    /// under these options" — the no-value signal, not an error.
    pub fn lookup(&self, key: &str, mut opts: Options) -> RecallResult<Option<Value>> {
        let (key, store) = self.resolve(key, &mut opts)?;
        self.read_valid(&key, &store, &opts)
    }

    /// Retrieve a cached value, computing and persisting it on a miss.
    ///
    /// When the effective options carry an `etagger` but no `etag`, the
    /// dynamic etag is computed from `args` first and participates in both
    /// the validity check and the stored entry. The lock (if any) brackets
    /// only the computation; a failing computation writes nothing and the
    /// error propagates unchanged.
    pub fn get_or_compute<F>(
        &self,
        key: &str,
        compute: F,
        args: &CallArgs,
        mut opts: Options,
    ) -> RecallResult<Value>
    where
        F: FnOnce(&CallArgs) -> RecallResult<Value>,
    {
        let (key, store) = self.resolve(key, &mut opts)?;

        if opts.etag.is_none() {
            if let Some(etagger) = opts.etagger.clone() {
                opts.etag = Some(etagger(args));
            }
        }

        if let Some(value) = self.read_valid(&key, &store, &opts)? {
            return Ok(value);
        }

        tracing::debug!(key, "cache miss, recomputing");
        let value = {
            let _guard = LockGuard::acquire(&key, &opts, store.as_ref());
            compute(args)?
        };

        let entry = CacheEntry::new(
            value.clone(),
            Utc::now(),
            opts.expiry,
            opts.max_age,
            opts.etag.clone(),
        );
        store.set(&key, entry)?;

        Ok(value)
    }

    /// Remove a key. Absent keys succeed silently.
    pub fn delete(&self, key: &str, mut opts: Options) -> RecallResult<()> {
        let (key, store) = self.resolve(key, &mut opts)?;
        match store.delete(&key) {
            Ok(()) | Err(StoreError::NotFound { .. }) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Rewrite the expiry of an existing entry; missing keys are an error.
    pub fn expire_at(&self, key: &str, when: Timestamp, mut opts: Options) -> RecallResult<()> {
        let (key, store) = self.resolve(key, &mut opts)?;
        match store.get(&key)? {
            Some(entry) => {
                entry.validate()?;
                store.set(&key, entry.with_expiry(Some(when)))?;
                Ok(())
            }
            None => Err(StoreError::NotFound { key }.into()),
        }
    }

    /// Expire a key `max_age` from now. A duration past the representable
    /// range clamps to the far end of time.
    pub fn expire(&self, key: &str, max_age: Duration, opts: Options) -> RecallResult<()> {
        let when = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_add_signed(age))
            .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC);
        self.expire_at(key, when, opts)
    }

    /// Remaining time-to-live for a key.
    ///
    /// A backend with a native TTL query answers directly. Otherwise the
    /// TTL is the stored expiry minus now, floored at zero — and a
    /// zero-or-negative remainder collapses into `None`, the same signal
    /// as "no expiry set".
    pub fn ttl(&self, key: &str, mut opts: Options) -> RecallResult<Option<Duration>> {
        let (key, store) = self.resolve(key, &mut opts)?;

        if let TtlQuery::Known(ttl) = store.ttl(&key) {
            return Ok(ttl);
        }

        let Some(entry) = store.get(&key)? else {
            return Ok(None);
        };
        Ok(entry.expires_at.and_then(|at| {
            let remaining = at - Utc::now();
            if remaining > chrono::Duration::zero() {
                remaining.to_std().ok()
            } else {
                None
            }
        }))
    }

    /// Stored etag for a key, if any.
    pub fn etag(&self, key: &str, mut opts: Options) -> RecallResult<Option<String>> {
        let (key, store) = self.resolve(key, &mut opts)?;
        Ok(store.get(&key)?.and_then(|entry| entry.etag))
    }

    /// Whether a valid entry exists under these options.
    ///
    /// Same validity check as a read, but never recomputes and never
    /// mutates the store: an entry that looks expired here may be expired
    /// only for this call's options (a stricter `max_age`, say), so it is
    /// not purged.
    pub fn exists(&self, key: &str, mut opts: Options) -> RecallResult<bool> {
        let (key, store) = self.resolve(key, &mut opts)?;
        match store.get(&key)? {
            Some(entry) => {
                entry.validate()?;
                Ok(!has_expired(&entry, &opts, Utc::now()))
            }
            None => Ok(false),
        }
    }

    /// Wrap a computation with no decoration-time options.
    pub fn wrap<F>(self: &Arc<Self>, signature: Signature, func: F) -> MemoizedFn
    where
        F: Fn(&CallArgs) -> RecallResult<Value> + Send + Sync + 'static,
    {
        self.wrap_with(signature, func, &[], Options::new())
    }

    /// Wrap a computation with master-key components and options.
    ///
    /// The components become a static prefix shared by every call through
    /// the returned wrapper; the options are merged beneath any call-site
    /// options on every operation.
    pub fn wrap_with<F>(
        self: &Arc<Self>,
        signature: Signature,
        func: F,
        master_components: &[Value],
        options: Options,
    ) -> MemoizedFn
    where
        F: Fn(&CallArgs) -> RecallResult<Value> + Send + Sync + 'static,
    {
        MemoizedFn::new(
            Arc::clone(self),
            signature,
            Arc::new(func) as ComputeFn,
            master_key(master_components),
            options,
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use recall_core::{EntryError, RecallError, RegionError, Store};
    use serde_json::json;

    fn memo_with_store() -> (Arc<Memoizer>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let memo = Arc::new(Memoizer::new(store.clone(), Options::new()));
        (memo, store)
    }

    #[test]
    fn test_lookup_without_compute_is_none() {
        let (memo, _store) = memo_with_store();
        assert_eq!(memo.lookup("k", Options::new()).unwrap(), None);
    }

    #[test]
    fn test_get_or_compute_round_trip() {
        let (memo, _store) = memo_with_store();
        let value = memo
            .get_or_compute("k", |_| Ok(json!([1, 2])), &CallArgs::new(), Options::new())
            .unwrap();
        assert_eq!(value, json!([1, 2]));
        assert_eq!(memo.lookup("k", Options::new()).unwrap(), Some(json!([1, 2])));
    }

    #[test]
    fn test_failed_compute_writes_nothing() {
        let (memo, store) = memo_with_store();
        let result = memo.get_or_compute(
            "k",
            |_| {
                Err(RecallError::compute(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "boom",
                )))
            },
            &CallArgs::new(),
            Options::new(),
        );
        assert!(matches!(result, Err(RecallError::Compute(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_missing_is_silent() {
        let (memo, _store) = memo_with_store();
        assert!(memo.delete("missing", Options::new()).is_ok());
    }

    #[test]
    fn test_expire_at_missing_is_not_found() {
        let (memo, _store) = memo_with_store();
        let result = memo.expire_at("missing", Utc::now(), Options::new());
        assert!(matches!(
            result,
            Err(RecallError::Store(StoreError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_expire_at_rewrites_only_expiry() {
        let (memo, store) = memo_with_store();
        memo.get_or_compute("k", |_| Ok(json!("v")), &CallArgs::new(), Options::new())
            .unwrap();

        let when = Utc::now() + chrono::Duration::seconds(60);
        memo.expire_at("k", when, Options::new()).unwrap();

        let entry = store.get("k").unwrap().unwrap();
        assert_eq!(entry.expires_at, Some(when));
        assert_eq!(entry.value, json!("v"));
    }

    #[test]
    fn test_ttl_from_stored_expiry() {
        let (memo, _store) = memo_with_store();
        memo.get_or_compute(
            "k",
            |_| Ok(json!(1)),
            &CallArgs::new(),
            Options::new().with_max_age(Duration::from_secs(3600)),
        )
        .unwrap();

        let ttl = memo.ttl("k", Options::new()).unwrap().expect("ttl set");
        assert!(ttl <= Duration::from_secs(3600));
        assert!(ttl > Duration::from_secs(3590));
    }

    #[test]
    fn test_ttl_none_for_missing_and_unexpiring() {
        let (memo, _store) = memo_with_store();
        assert_eq!(memo.ttl("missing", Options::new()).unwrap(), None);

        memo.get_or_compute("k", |_| Ok(json!(1)), &CallArgs::new(), Options::new())
            .unwrap();
        assert_eq!(memo.ttl("k", Options::new()).unwrap(), None);
    }

    #[test]
    fn test_ttl_elapsed_collapses_to_none() {
        // Zero-or-negative remaining time reads the same as "no expiry".
        let (memo, _store) = memo_with_store();
        memo.get_or_compute(
            "k",
            |_| Ok(json!(1)),
            &CallArgs::new(),
            Options::new().with_expiry(Utc::now() - chrono::Duration::seconds(5)),
        )
        .unwrap();
        assert_eq!(memo.ttl("k", Options::new()).unwrap(), None);
    }

    #[test]
    fn test_native_ttl_is_preferred() {
        struct NativeTtlStore {
            inner: MemoryStore,
        }
        impl recall_core::Store for NativeTtlStore {
            fn get(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
                self.inner.get(key)
            }
            fn set(&self, key: &str, entry: CacheEntry) -> Result<(), StoreError> {
                self.inner.set(key, entry)
            }
            fn delete(&self, key: &str) -> Result<(), StoreError> {
                self.inner.delete(key)
            }
            fn ttl(&self, _key: &str) -> TtlQuery {
                TtlQuery::Known(Some(Duration::from_secs(7)))
            }
        }

        let store = Arc::new(NativeTtlStore {
            inner: MemoryStore::new(),
        });
        let memo = Memoizer::new(store, Options::new());
        assert_eq!(
            memo.ttl("anything", Options::new()).unwrap(),
            Some(Duration::from_secs(7))
        );
    }

    #[test]
    fn test_etag_readback() {
        let (memo, _store) = memo_with_store();
        memo.get_or_compute(
            "k",
            |_| Ok(json!(1)),
            &CallArgs::new(),
            Options::new().with_etag("v1"),
        )
        .unwrap();
        assert_eq!(memo.etag("k", Options::new()).unwrap(), Some("v1".to_string()));
        assert_eq!(memo.etag("missing", Options::new()).unwrap(), None);
    }

    #[test]
    fn test_exists_does_not_purge_expired_entries() {
        let (memo, store) = memo_with_store();
        memo.get_or_compute("k", |_| Ok(json!(1)), &CallArgs::new(), Options::new())
            .unwrap();

        // Expired only under this call's max_age.
        let strict = Options::new().with_max_age(Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(!memo.exists("k", strict).unwrap());

        // The entry itself is untouched and valid under default options.
        assert!(store.contains_key("k"));
        assert!(memo.exists("k", Options::new()).unwrap());
    }

    #[test]
    fn test_protocol_mismatch_is_fatal_not_a_miss() {
        let (memo, store) = memo_with_store();
        let mut entry = CacheEntry::new(json!(1), Utc::now(), None, None, None);
        entry.protocol = 9;
        store.set("k", entry).unwrap();

        let result = memo.lookup("k", Options::new());
        assert!(matches!(
            result,
            Err(RecallError::Entry(EntryError::ProtocolMismatch { found: 9, .. }))
        ));
        let result = memo.exists("k", Options::new());
        assert!(matches!(result, Err(RecallError::Entry(_))));
    }

    #[test]
    fn test_unresolved_region_propagates() {
        let (memo, _store) = memo_with_store();
        let result = memo.lookup("k", Options::new().with_region("ghost"));
        assert!(matches!(
            result,
            Err(RecallError::Region(RegionError::Unknown { .. }))
        ));
    }

    #[test]
    fn test_write_happens_outside_the_lock() {
        use recall_core::{Lock, LockFactory};
        use std::sync::Mutex;

        #[derive(Debug, PartialEq)]
        enum Event {
            Acquire,
            Release,
            Write,
        }
        let events = Arc::new(Mutex::new(Vec::new()));

        struct ObservingStore {
            inner: MemoryStore,
            events: Arc<Mutex<Vec<Event>>>,
        }
        impl recall_core::Store for ObservingStore {
            fn get(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
                self.inner.get(key)
            }
            fn set(&self, key: &str, entry: CacheEntry) -> Result<(), StoreError> {
                self.events.lock().unwrap().push(Event::Write);
                self.inner.set(key, entry)
            }
            fn delete(&self, key: &str) -> Result<(), StoreError> {
                self.inner.delete(key)
            }
        }

        struct ObservingLock {
            events: Arc<Mutex<Vec<Event>>>,
        }
        impl Lock for ObservingLock {
            fn acquire(&mut self, _timeout: Duration) -> bool {
                self.events.lock().unwrap().push(Event::Acquire);
                true
            }
            fn release(&mut self) {
                self.events.lock().unwrap().push(Event::Release);
            }
        }

        let store = Arc::new(ObservingStore {
            inner: MemoryStore::new(),
            events: events.clone(),
        });
        let lock_events = events.clone();
        let factory: LockFactory = Arc::new(move |_key: &str| {
            Box::new(ObservingLock {
                events: lock_events.clone(),
            }) as Box<dyn Lock>
        });

        let memo = Memoizer::new(store, Options::new().with_lock(factory));
        memo.get_or_compute("k", |_| Ok(json!(1)), &CallArgs::new(), Options::new())
            .unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![Event::Acquire, Event::Release, Event::Write]
        );
    }
}
