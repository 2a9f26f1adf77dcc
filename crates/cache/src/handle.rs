//! Holder handles
//!
//! A [`Handle`] represents exactly one reference to one cache entry — the
//! unit the refcount counts. Handles are deliberately not `Clone`: a new
//! reference comes only from `SnapshotCache::acquire`, and giving one up
//! consumes the handle, so a single handle can never release twice.
//!
//! Dropping a handle without calling [`release`](Handle::release) or
//! [`expire`](Handle::expire) leaks its reference; the registry has no
//! teardown beyond process exit.

use crate::cache::SnapshotCache;
use crate::entry::SnapshotEntry;
use snapquery_core::{Result, Signature};
use std::sync::Arc;
use std::time::Duration;

/// One live reference to a cached snapshot entry.
#[derive(Debug)]
pub struct Handle {
    cache: SnapshotCache,
    signature: Signature,
}

impl Handle {
    pub(crate) fn new(cache: SnapshotCache, signature: Signature) -> Self {
        Handle { cache, signature }
    }

    /// The signature this handle refers to
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The cache service this handle belongs to
    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Resolve the live entry behind this handle.
    ///
    /// Fails with `EntryDestroyed` when the entry has left the registry —
    /// possible even while holding a handle, because the `expire` contract
    /// can retire an entry out from under slower holders.
    pub fn entry(&self) -> Result<Arc<SnapshotEntry>> {
        self.cache.lookup(&self.signature)
    }

    /// Give up this reference immediately.
    ///
    /// If the decrement brings the holder count below 1 the entry is
    /// removed from the registry synchronously.
    pub fn release(self) -> Result<()> {
        self.cache.release_ref(&self.signature)
    }

    /// Give up this reference now and schedule delayed eviction.
    ///
    /// Decrements the refcount immediately — this decrement never evicts,
    /// even at zero. The first `expire` on an entry also arms a one-shot
    /// timer that, after `ttl`, performs a second decrement with the same
    /// remove-below-1 check as [`release`](Handle::release). Later expires
    /// on the same entry decrement but never re-arm.
    pub fn expire(self, ttl: Duration) -> Result<()> {
        self.cache.expire_ref(&self.signature, ttl)
    }
}
