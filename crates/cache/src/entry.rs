//! Cache entries and load readiness
//!
//! A [`SnapshotEntry`] is the unit the registry stores per signature. Its
//! payload is written exactly once when the external loader completes and
//! is read-only afterwards, so readers never need a lock for row access —
//! only the initial conditional write is guarded (`OnceCell`).
//!
//! # Readiness
//!
//! Every holder of an entry must be able to await the same load completion
//! without lost wake-ups, including holders that attach while the load is
//! still in flight. A `tokio::sync::watch` channel carries the
//! [`LoadState`]; the entry owns the sender and each waiter subscribes.
//! The state moves `Pending → Ready` or `Pending → Failed` exactly once.
//! A failed load settles the channel too, so waiters fail fast with
//! [`Error::LoadFailed`] instead of blocking forever.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use snapquery_core::{Error, Result, Signature, Snapshot};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Load progress of an entry, broadcast to every waiter.
#[derive(Debug, Clone)]
pub enum LoadState {
    /// Loader still in flight
    Pending,
    /// Snapshot materialized; `SnapshotEntry::snapshot` is populated
    Ready,
    /// Loader settled with a failure; carries the failure text
    Failed(Arc<str>),
}

/// One cached dataset: lifecycle counters plus the write-once payload.
///
/// Refcount and TTL-armed flag are atomics, but they are only mutated while
/// the registry holds the shard lock for this entry's key; the atomics give
/// cross-thread visibility, the shard lock gives atomicity of
/// decrement-and-remove decisions.
pub struct SnapshotEntry {
    signature: Signature,
    created_at: DateTime<Utc>,
    refcount: AtomicI64,
    ttl_armed: AtomicBool,
    data: OnceCell<Snapshot>,
    ready: watch::Sender<LoadState>,
}

impl SnapshotEntry {
    /// Create a pending entry with a refcount of 1 (the creator's hold)
    pub(crate) fn new(signature: Signature) -> Self {
        let (ready, _) = watch::channel(LoadState::Pending);
        SnapshotEntry {
            signature,
            created_at: Utc::now(),
            refcount: AtomicI64::new(1),
            ttl_armed: AtomicBool::new(false),
            data: OnceCell::new(),
            ready,
        }
    }

    /// The signature this entry is registered under
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// When the entry was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current number of live holders
    pub fn refcount(&self) -> i64 {
        self.refcount.load(Ordering::Acquire)
    }

    /// Whether a delayed-eviction timer has ever been armed for this entry
    pub fn ttl_armed(&self) -> bool {
        self.ttl_armed.load(Ordering::Acquire)
    }

    /// Whether the loader has completed successfully
    pub fn is_ready(&self) -> bool {
        matches!(*self.ready.borrow(), LoadState::Ready)
    }

    /// The materialized snapshot, if the load has completed
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.data.get()
    }

    /// The materialized snapshot after [`wait_ready`](Self::wait_ready)
    ///
    /// Maps the only possible absence (a settled-but-failed load) to
    /// [`Error::LoadFailed`].
    pub fn snapshot_ready(&self) -> Result<&Snapshot> {
        self.data
            .get()
            .ok_or_else(|| Error::LoadFailed("snapshot not materialized".to_string()))
    }

    /// Await load completion shared by every holder of this entry.
    ///
    /// Resolves `Ok(())` once the snapshot is materialized, or
    /// `Err(LoadFailed)` if the loader settled with a failure. Waiters that
    /// subscribe after completion observe the settled state immediately.
    pub async fn wait_ready(&self) -> Result<()> {
        let mut rx = self.ready.subscribe();
        let state = rx
            .wait_for(|state| !matches!(state, LoadState::Pending))
            .await
            .map_err(|_| Error::LoadFailed("readiness channel closed".to_string()))?;
        match &*state {
            LoadState::Ready => Ok(()),
            LoadState::Failed(cause) => Err(Error::LoadFailed(cause.to_string())),
            LoadState::Pending => unreachable!("wait_for filtered pending states"),
        }
    }

    /// Populate the payload and settle readiness. Called exactly once by
    /// the spawned loader task.
    ///
    /// `send_replace` stores the state even when no waiter has subscribed
    /// yet; a plain `send` would be lost on a receiverless channel.
    pub(crate) fn complete(&self, snapshot: Snapshot) {
        if self.data.set(snapshot).is_ok() {
            debug!(signature = %self.signature, "snapshot load completed");
            self.ready.send_replace(LoadState::Ready);
        }
    }

    /// Settle readiness with a failure. Called at most once by the spawned
    /// loader task.
    pub(crate) fn fail(&self, cause: String) {
        debug!(signature = %self.signature, %cause, "snapshot load failed");
        self.ready.send_replace(LoadState::Failed(cause.into()));
    }

    /// Increment the refcount. Caller must hold the registry shard lock.
    pub(crate) fn add_ref(&self) -> i64 {
        self.refcount.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrement the refcount, returning the new count. Caller must hold
    /// the registry shard lock.
    pub(crate) fn dec_ref(&self) -> i64 {
        self.refcount.fetch_sub(1, Ordering::AcqRel) - 1
    }

    /// Arm the TTL flag; returns true only for the first caller.
    /// false→true happens at most once per entry, re-arming never occurs.
    pub(crate) fn arm_ttl(&self) -> bool {
        self.ttl_armed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl std::fmt::Debug for SnapshotEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotEntry")
            .field("signature", &self.signature)
            .field("refcount", &self.refcount())
            .field("ttl_armed", &self.ttl_armed())
            .field("ready", &self.is_ready())
            .finish()
    }
}
