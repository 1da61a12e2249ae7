//! Memoized function wrappers.
//!
//! A `MemoizedFn` ties a computation, its declared signature, and a set of
//! decoration-time options to a shared [`Memoizer`](crate::Memoizer). Every
//! operation derives the same canonical key from the call arguments, so
//! `call`, `get`, `delete`, and the rest all address the same entry.
//!
//! Wrappers are cheap to clone; [`bind`](MemoizedFn::bind) builds on that to
//! produce partially-applied wrappers, the moral equivalent of decorating a
//! method (bind the receiver, memoize over the remaining arguments).

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use recall_core::{CallArgs, Options, RecallResult, Timestamp};

use crate::key::{build_key, Signature};
use crate::memoizer::Memoizer;

/// Shared computation behind a wrapper.
pub type ComputeFn = Arc<dyn Fn(&CallArgs) -> RecallResult<Value> + Send + Sync>;

/// A computation wrapped for memoization.
#[derive(Clone)]
pub struct MemoizedFn {
    cache: Arc<Memoizer>,
    func: ComputeFn,
    signature: Signature,
    master_key: Option<String>,
    opts: Options,
    bound: CallArgs,
}

impl MemoizedFn {
    pub(crate) fn new(
        cache: Arc<Memoizer>,
        signature: Signature,
        func: ComputeFn,
        master_key: Option<String>,
        opts: Options,
    ) -> Self {
        Self {
            cache,
            func,
            signature,
            master_key,
            opts,
            bound: CallArgs::new(),
        }
    }

    /// Partially apply arguments, yielding a wrapper over the remainder.
    ///
    /// Bound arguments are prepended to every later call (keywords from the
    /// later call win over bound keywords), so both wrappers address the
    /// same keys for the same effective call.
    pub fn bind(&self, args: CallArgs) -> Self {
        let mut bound = self.clone();
        bound.bound = self.bound.merge_with(&args);
        bound
    }

    /// The canonical key this wrapper derives for `args`.
    pub fn key(&self, args: &CallArgs) -> String {
        build_key(
            &self.signature,
            &self.bound.merge_with(args),
            self.master_key.as_deref(),
        )
    }

    /// Call-site options merged over the decoration-time options.
    fn effective_opts(&self, opts: Options) -> Options {
        let mut merged = opts;
        merged.merge_from(&self.opts);
        merged
    }

    /// Invoke through the cache: a valid entry is returned as-is, otherwise
    /// the wrapped computation runs and its result is stored.
    pub fn call(&self, args: CallArgs) -> RecallResult<Value> {
        self.get(&args, Options::new())
    }

    /// `call` with call-site option overrides.
    ///
    /// The wrapped computation is carried through to the cache, so a miss
    /// or an invalidated entry (including a dynamic-etag mismatch)
    /// recomputes here exactly as it does on a plain call.
    pub fn get(&self, args: &CallArgs, opts: Options) -> RecallResult<Value> {
        let args = self.bound.merge_with(args);
        let key = build_key(&self.signature, &args, self.master_key.as_deref());
        self.cache
            .get_or_compute(&key, |args| (self.func)(args), &args, self.effective_opts(opts))
    }

    /// Delete the entry for `args`.
    pub fn delete(&self, args: &CallArgs, opts: Options) -> RecallResult<()> {
        self.cache.delete(&self.key(args), self.effective_opts(opts))
    }

    /// Expire the entry for `args` a duration from now.
    pub fn expire(&self, max_age: Duration, args: &CallArgs, opts: Options) -> RecallResult<()> {
        self.cache
            .expire(&self.key(args), max_age, self.effective_opts(opts))
    }

    /// Rewrite the expiry of the entry for `args`.
    pub fn expire_at(
        &self,
        when: Timestamp,
        args: &CallArgs,
        opts: Options,
    ) -> RecallResult<()> {
        self.cache
            .expire_at(&self.key(args), when, self.effective_opts(opts))
    }

    /// Remaining time-to-live of the entry for `args`.
    pub fn ttl(&self, args: &CallArgs, opts: Options) -> RecallResult<Option<Duration>> {
        self.cache.ttl(&self.key(args), self.effective_opts(opts))
    }

    /// Whether a valid entry exists for `args`.
    pub fn exists(&self, args: &CallArgs, opts: Options) -> RecallResult<bool> {
        self.cache.exists(&self.key(args), self.effective_opts(opts))
    }

    /// Stored etag of the entry for `args`.
    pub fn etag(&self, args: &CallArgs, opts: Options) -> RecallResult<Option<String>> {
        self.cache.etag(&self.key(args), self.effective_opts(opts))
    }
}

// =============================================================================
// TESTS
// =============================================================================
