//! Entry validity evaluation.
//!
//! Four independent expiry signals, all pure checks against a supplied
//! `now`. The entry's protocol version has already been validated by the
//! time an entry reaches this module.

use recall_core::{CacheEntry, Options, Timestamp};

/// Whether `entry` is expired under `opts` at `now`.
///
/// An entry is expired if ANY of these hold:
///
/// 1. the stored expiry is set and strictly before `now` (an expiry equal
///    to `now` is still valid);
/// 2. the options carry an etag that differs from the stored one;
/// 3. the options carry an `expiry` strictly before `now` — a read-time
///    invalidation lever that trumps whatever is stored;
/// 4. the options carry a `max_age` the entry has outlived.
pub fn has_expired(entry: &CacheEntry, opts: &Options, now: Timestamp) -> bool {
    if entry.expires_at.is_some_and(|at| at < now) {
        return true;
    }

    if let Some(expected) = opts.etag.as_deref() {
        if entry.etag.as_deref() != Some(expected) {
            return true;
        }
    }

    if opts.expiry.is_some_and(|at| at < now) {
        return true;
    }

    if let Some(max_age) = opts.max_age {
        // Overflow, in the conversion or the addition, means a deadline
        // beyond representable time: not expired.
        if chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| entry.created_at.checked_add_signed(age))
            .is_some_and(|deadline| deadline < now)
        {
            return true;
        }
    }

    false
}

// =============================================================================
// TESTS
// =============================================================================
