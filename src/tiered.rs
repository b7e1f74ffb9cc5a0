//! Tiered Cache Coordinator
//!
//! Routes every cache operation across two tiers: a process-local
//! accelerator and an authoritative remote store. The remote tier is the
//! single source of truth; the local tier only ever changes latency, never
//! correctness. Local-tier failures are swallowed and logged, remote-tier
//! failures surface to the caller.

use bytes::Bytes;
use tracing::{debug, info};

use crate::backend::{CacheBackend, CacheEntry, RemoteBackend};
use crate::error::Result;
use crate::options::OperationOptions;

// == Tiered Cache ==
/// Two-tier cache coordinator.
///
/// Owns one remote backend (authoritative, shared) and one local backend
/// (best-effort accelerator). Backend calls within one operation are issued
/// sequentially in a fixed order; no coordinator-level locking or per-key
/// serialization is added on top of what the backends provide.
#[derive(Debug)]
pub struct TieredCache<R, L> {
    /// Authoritative tier
    remote: R,
    /// Process-local acceleration tier
    local: L,
}

impl<R: RemoteBackend, L: CacheBackend> TieredCache<R, L> {
    // == Constructor ==
    /// Creates a coordinator over the given backends.
    ///
    /// Pass `Arc` handles when another holder (a test harness, a stats
    /// scraper) needs to reach a backend directly.
    pub fn new(remote: R, local: L) -> Self {
        Self { remote, local }
    }

    // == Read ==
    /// Retrieves an entry by key.
    ///
    /// Without `use_local` this is exactly a remote read. With `use_local`
    /// the local tier is consulted first; a local hit short-circuits the
    /// remote round trip and may be stale for up to the local TTL. A local
    /// miss falls through to the remote tier, and a remote hit backfills
    /// the local tier (with `local_ttl`, or the local default) before
    /// returning. Backfill failure never fails the read.
    pub async fn read(&self, key: &str, options: &OperationOptions) -> Result<Option<CacheEntry>> {
        let backend_opts = options.backend_options();

        if !options.use_local {
            return self.remote.get(key, backend_opts).await;
        }

        // Local errors degrade to a miss; the remote tier stays authoritative
        match self.local.get(key, backend_opts).await {
            Ok(Some(entry)) => return Ok(Some(entry)),
            Ok(None) => {}
            Err(err) => debug!(key, error = %err, "local read failed, falling through to remote"),
        }

        let entry = match self.remote.get(key, backend_opts).await? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        // Backfill so the next local-first read can skip the remote trip.
        // Deliberately fire-and-forget: the result is logged and discarded.
        if let Err(err) = self
            .local
            .put(key, &entry, options.local_ttl, backend_opts)
            .await
        {
            debug!(key, error = %err, "local backfill failed, serving remote hit anyway");
        }

        Ok(Some(entry))
    }

    // == Write ==
    /// Stores a value.
    ///
    /// The remote write happens first (with `ttl`) and its outcome is the
    /// outcome of the whole operation. With `use_local`, a successful
    /// remote write is followed by a local write (with `local_ttl`) whose
    /// failure is swallowed: the local tier is an accelerator, so its
    /// unavailability must cost latency, not correctness.
    pub async fn write(
        &self,
        key: &str,
        value: impl Into<Bytes>,
        options: &OperationOptions,
    ) -> Result<()> {
        let backend_opts = options.backend_options();
        let entry = CacheEntry::new(value, options.ttl);

        // Remote failure skips the local write entirely, so the local tier
        // never holds a value the remote tier never accepted
        self.remote
            .put(key, &entry, options.ttl, backend_opts)
            .await?;

        if options.use_local {
            if let Err(err) = self
                .local
                .put(key, &entry, options.local_ttl, backend_opts)
                .await
            {
                debug!(key, error = %err, "local write-through failed");
            }
        }

        Ok(())
    }

    // == Fetch ==
    /// Read-through: returns the stored value if present, otherwise invokes
    /// `compute` exactly once, writes the result, and returns it.
    ///
    /// Routes through [`read`](Self::read) and [`write`](Self::write), so a
    /// local-tier miss that hits remote backfills the local tier before the
    /// decision to compute is made. Concurrent callers missing on the same
    /// key may each compute independently; no per-key serialization exists.
    pub async fn fetch<F>(&self, key: &str, options: &OperationOptions, compute: F) -> Result<Bytes>
    where
        F: FnOnce() -> Bytes,
    {
        if let Some(entry) = self.read(key, options).await? {
            return Ok(entry.value);
        }

        let value = compute();
        self.write(key, value.clone(), options).await?;
        Ok(value)
    }

    // == Delete ==
    /// Removes a key from both tiers, local first.
    ///
    /// Both deletions are attempted even if one fails; there is no
    /// rollback. Returns whether the remote tier removed an entry.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        if let Err(err) = self.local.delete(key).await {
            debug!(key, error = %err, "local delete failed");
        }
        self.remote.delete(key).await
    }

    // == Exists ==
    /// Authoritative existence check, remote tier only.
    ///
    /// Local presence is deliberately not consulted: existence means
    /// durable, shared existence, independent of acceleration state.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        self.remote.exists(key).await
    }

    // == Clear ==
    /// Empties both tiers, local first.
    ///
    /// A racing reader may observe the transient state where the local
    /// tier is empty but the remote tier still has data.
    pub async fn clear(&self) -> Result<()> {
        if let Err(err) = self.local.clear().await {
            debug!(error = %err, "local clear failed");
        }
        self.remote.clear().await
    }

    // == Cleanup ==
    /// Expunges expired entries from the local tier and returns how many
    /// were removed. The remote tier manages its own expiration and is not
    /// consulted. Never fails: a local fault yields zero removals.
    pub async fn cleanup(&self) -> usize {
        match self.local.cleanup().await {
            Ok(removed) => removed,
            Err(err) => {
                debug!(error = %err, "local cleanup failed");
                0
            }
        }
    }

    // == Increment ==
    /// Atomically adds `amount` to the counter at `key` on the remote tier
    /// and returns the new value.
    ///
    /// Counters need a single cross-process sequence point, which only the
    /// remote tier can provide, so `use_local` is ignored here and the
    /// local tier is never touched.
    pub async fn increment(
        &self,
        key: &str,
        amount: i64,
        _options: &OperationOptions,
    ) -> Result<i64> {
        self.remote.increment(key, amount).await
    }

    // == Decrement ==
    /// Atomically subtracts `amount`; equivalent to incrementing by
    /// `-amount`. Remote tier only, like [`increment`](Self::increment).
    pub async fn decrement(
        &self,
        key: &str,
        amount: i64,
        _options: &OperationOptions,
    ) -> Result<i64> {
        self.remote.decrement(key, amount).await
    }

    // == Delete Matching ==
    /// Applies a glob-style pattern delete to both tiers, local first.
    ///
    /// Each backend interprets the pattern with its own matching semantics.
    /// Both tiers are always attempted (a key absent from one tier is
    /// already deleted there). Returns the remote tier's removal count.
    pub async fn delete_matching(&self, pattern: &str) -> Result<usize> {
        match self.local.delete_matching(pattern).await {
            Ok(removed) if removed > 0 => {
                info!(pattern, removed, "local pattern delete");
            }
            Ok(_) => {}
            Err(err) => debug!(pattern, error = %err, "local pattern delete failed"),
        }
        self.remote.delete_matching(pattern).await
    }
}
