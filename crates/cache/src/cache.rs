//! Single-flight snapshot registry
//!
//! [`SnapshotCache`] maps signatures to [`SnapshotEntry`]s. It is an
//! explicit service object — construct one and pass it (cheaply cloned) to
//! every consumer; there is no hidden global.
//!
//! # Single-flight
//!
//! The registry is a `DashMap` and every lifecycle mutation goes through
//! its entry API, which holds the shard lock for the key across the whole
//! check-then-act step:
//!
//! - acquire: "does an entry exist" + insert is one uninterruptible step,
//!   so concurrent acquires for a not-yet-ready signature all attach to the
//!   same entry and exactly one loader is ever spawned.
//! - release: decrement + remove-if-below-1 is one uninterruptible step, so
//!   a racing acquire either attaches before the decrement or finds the
//!   entry gone — never a half-destroyed entry.
//!
//! # Eviction paths
//!
//! Immediate: a release that brings the refcount below 1 removes the entry
//! synchronously. Delayed: `expire` gives up the caller's reference now and
//! arms (once per entry, ever) a timer whose fire performs one more
//! decrement with the same removal check. Neither path retries anything.

use crate::entry::SnapshotEntry;
use crate::handle::Handle;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use snapquery_core::{Error, Result, Signature, Snapshot};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

struct CacheInner {
    entries: DashMap<Signature, Arc<SnapshotEntry>>,
}

/// Process-wide (per instance) snapshot cache with single-flight loading,
/// reference counting, and TTL decay.
///
/// Cloning is cheap and every clone operates on the same registry.
///
/// # Example
///
/// ```ignore
/// use snapquery_cache::SnapshotCache;
/// use snapquery_core::Snapshot;
///
/// let cache = SnapshotCache::new();
/// let handle = cache.acquire("users:all", || async {
///     Ok(Snapshot::new(load_rows().await?, load_columns().await?))
/// });
/// handle.entry()?.wait_ready().await?;
/// handle.release()?;
/// ```
#[derive(Clone)]
pub struct SnapshotCache {
    inner: Arc<CacheInner>,
}

impl SnapshotCache {
    /// Create an empty cache
    pub fn new() -> Self {
        SnapshotCache {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
            }),
        }
    }

    /// Acquire a handle for `signature`, loading the dataset if this is the
    /// first request.
    ///
    /// If no entry exists, one is created with a refcount of 1 and `loader`
    /// is invoked exactly once; its future runs on the tokio runtime and its
    /// completion populates the entry and settles readiness for every
    /// holder. If an entry already exists — ready or still loading — its
    /// refcount is incremented and `loader` is never invoked.
    ///
    /// Must be called from within a tokio runtime.
    pub fn acquire<L, Fut>(&self, signature: impl Into<Signature>, loader: L) -> Handle
    where
        L: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Snapshot, String>> + Send + 'static,
    {
        let signature = signature.into();
        let spawn = match self.inner.entries.entry(signature.clone()) {
            Entry::Occupied(occupied) => {
                let holders = occupied.get().add_ref();
                debug!(%signature, holders, "attached to existing snapshot entry");
                None
            }
            Entry::Vacant(vacant) => {
                let entry = Arc::new(SnapshotEntry::new(signature.clone()));
                vacant.insert(Arc::clone(&entry));
                debug!(%signature, "created snapshot entry");
                // The closure only runs on the create path, so an attach
                // never constructs the caller's future.
                Some((entry, loader()))
            }
        };

        // Spawn outside the shard lock
        if let Some((entry, load)) = spawn {
            tokio::spawn(async move {
                match load.await {
                    Ok(snapshot) => entry.complete(snapshot),
                    Err(cause) => entry.fail(cause),
                }
            });
        }

        Handle::new(self.clone(), signature)
    }

    /// Look up the live entry for a signature without touching its refcount.
    ///
    /// Used by `Handle::query()` and by the pipeline's join stage to resolve
    /// foreign snapshots at execution time.
    pub fn lookup(&self, signature: &Signature) -> Result<Arc<SnapshotEntry>> {
        self.inner
            .entries
            .get(signature)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::EntryDestroyed(signature.clone()))
    }

    /// Whether a live entry exists for the signature
    pub fn contains(&self, signature: &Signature) -> bool {
        self.inner.entries.contains_key(signature)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Drop one reference; remove the entry when the count falls below 1.
    ///
    /// The decrement and the removal decision happen under the entry's
    /// shard lock, synchronously with respect to each other.
    pub(crate) fn release_ref(&self, signature: &Signature) -> Result<()> {
        match self.inner.entries.entry(signature.clone()) {
            Entry::Occupied(occupied) => {
                let remaining = occupied.get().dec_ref();
                if remaining < 1 {
                    occupied.remove();
                    debug!(%signature, "snapshot entry removed");
                } else {
                    debug!(%signature, holders = remaining, "snapshot entry released");
                }
                Ok(())
            }
            Entry::Vacant(_) => Err(Error::EntryDestroyed(signature.clone())),
        }
    }

    /// Drop one reference WITHOUT the removal check, and arm the entry's
    /// one-shot decay timer if it has never been armed.
    ///
    /// The immediate decrement never evicts, even at zero; eviction on this
    /// path happens only when the armed timer fires and performs a second
    /// decrement with the same removal check as `release_ref`. Repeated
    /// calls each decrement, but only the first ever arms a timer.
    pub(crate) fn expire_ref(&self, signature: &Signature, ttl: Duration) -> Result<()> {
        let armed = match self.inner.entries.entry(signature.clone()) {
            Entry::Occupied(occupied) => {
                let entry = occupied.get();
                let holders = entry.dec_ref();
                let armed = entry.arm_ttl();
                debug!(%signature, holders, armed, "snapshot entry expiring");
                armed.then(|| Arc::clone(entry))
            }
            Entry::Vacant(_) => return Err(Error::EntryDestroyed(signature.clone())),
        };

        if let Some(armed_entry) = armed {
            let cache = self.clone();
            let signature = signature.clone();
            tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                cache.decay_fire(&signature, &armed_entry);
            });
        }
        Ok(())
    }

    /// Timer-fire decrement: one more reference drop with the same
    /// remove-below-1 check as `release_ref`.
    ///
    /// The timer belongs to the entry it was armed for. The entry may have
    /// been evicted through the immediate path in the meantime — and the
    /// signature may even map to a fresh successor entry by now, whose
    /// references this timer must not consume. A fire on a gone or replaced
    /// entry is a no-op.
    fn decay_fire(&self, signature: &Signature, armed_entry: &Arc<SnapshotEntry>) {
        match self.inner.entries.entry(signature.clone()) {
            Entry::Occupied(occupied) => {
                if !Arc::ptr_eq(occupied.get(), armed_entry) {
                    debug!(%signature, "decay timer fired on a successor entry");
                    return;
                }
                let remaining = occupied.get().dec_ref();
                if remaining < 1 {
                    occupied.remove();
                    debug!(%signature, "snapshot entry removed by decay");
                } else {
                    debug!(%signature, holders = remaining, "snapshot entry decayed");
                }
            }
            Entry::Vacant(_) => {
                debug!(%signature, "decay timer fired on removed entry");
            }
        }
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("entries", &self.len())
            .finish()
    }
}
