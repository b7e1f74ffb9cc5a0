//! Integration Tests for the Tiered Cache Coordinator
//!
//! Exercises the full two-tier routing policy: local-first reads, backfill,
//! write-through, tier-scoped deletes, counters, and the failure policy
//! (remote faults surface, local faults are swallowed).
//!
//! Remote outage is simulated two ways: clearing the remote tier through a
//! shared handle, and a fault-injecting wrapper backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use tiered_cache::{
    BackendOptions, CacheBackend, CacheEntry, CacheError, MemoryBackend, OperationOptions,
    RemoteBackend, Result, TieredCache,
};

// == Helper Types ==

/// Wraps a memory backend and fails every call while the fault flag is set.
struct FlakyBackend {
    inner: MemoryBackend,
    failing: AtomicBool,
}

impl FlakyBackend {
    fn new() -> Self {
        Self {
            inner: MemoryBackend::new(100, Duration::from_secs(300)),
            failing: AtomicBool::new(false),
        }
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CacheError::Backend("injected fault".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheBackend for FlakyBackend {
    async fn get(&self, key: &str, options: &BackendOptions) -> Result<Option<CacheEntry>> {
        self.check()?;
        self.inner.get(key, options).await
    }

    async fn put(
        &self,
        key: &str,
        entry: &CacheEntry,
        ttl: Option<Duration>,
        options: &BackendOptions,
    ) -> Result<()> {
        self.check()?;
        self.inner.put(key, entry, ttl, options).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn clear(&self) -> Result<()> {
        self.check()?;
        self.inner.clear().await
    }

    async fn delete_matching(&self, pattern: &str) -> Result<usize> {
        self.check()?;
        self.inner.delete_matching(pattern).await
    }

    async fn cleanup(&self) -> Result<usize> {
        self.check()?;
        self.inner.cleanup().await
    }
}

#[async_trait]
impl RemoteBackend for FlakyBackend {
    async fn exists(&self, key: &str) -> Result<bool> {
        self.check()?;
        self.inner.exists(key).await
    }

    async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        self.check()?;
        self.inner.increment(key, amount).await
    }
}

// == Helper Functions ==

type MemoryTiers = TieredCache<Arc<MemoryBackend>, Arc<MemoryBackend>>;

/// Coordinator over two memory backends, handles kept for tier inspection
/// and outage simulation.
fn build_cache() -> (MemoryTiers, Arc<MemoryBackend>, Arc<MemoryBackend>) {
    let remote = Arc::new(MemoryBackend::new(100, Duration::from_secs(300)));
    let local = Arc::new(MemoryBackend::new(100, Duration::from_secs(300)));
    let cache = TieredCache::new(remote.clone(), local.clone());
    (cache, remote, local)
}

fn no_opts() -> OperationOptions {
    OperationOptions::new()
}

fn local_opts() -> OperationOptions {
    OperationOptions::new().use_local(true)
}

// == Tiered Read/Write Tests ==

#[tokio::test]
async fn test_write_then_read_without_local() {
    let (cache, _remote, _local) = build_cache();

    cache.write("key1", "value1", &no_opts()).await.unwrap();
    let entry = cache.read("key1", &no_opts()).await.unwrap().unwrap();

    assert_eq!(entry.value, Bytes::from("value1"));
}

#[tokio::test]
async fn test_read_miss_returns_none() {
    let (cache, _remote, _local) = build_cache();

    assert!(cache.read("ghost", &no_opts()).await.unwrap().is_none());
    assert!(cache.read("ghost", &local_opts()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_local_population_on_remote_hit() {
    let (cache, remote, _local) = build_cache();

    cache.write("key1", "value1", &no_opts()).await.unwrap();

    // First local-first read misses local, hits remote, backfills local
    let entry = cache.read("key1", &local_opts()).await.unwrap().unwrap();
    assert_eq!(entry.value, Bytes::from("value1"));

    // Remote outage: the backfilled copy still serves the read
    remote.clear().await.unwrap();
    let entry = cache.read("key1", &local_opts()).await.unwrap().unwrap();
    assert_eq!(entry.value, Bytes::from("value1"));
}

#[tokio::test]
async fn test_plain_write_never_populates_local() {
    let (cache, remote, _local) = build_cache();

    cache.write("key1", "value1", &no_opts()).await.unwrap();
    remote.clear().await.unwrap();

    assert!(cache.read("key1", &local_opts()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_write_through_with_local() {
    let (cache, remote, _local) = build_cache();

    cache.write("key1", "value1", &local_opts()).await.unwrap();
    remote.clear().await.unwrap();

    let entry = cache.read("key1", &local_opts()).await.unwrap().unwrap();
    assert_eq!(entry.value, Bytes::from("value1"));
}

#[tokio::test]
async fn test_local_ttl_is_independent_of_remote_ttl() {
    let (cache, remote, _local) = build_cache();

    let opts = OperationOptions::new()
        .use_local(true)
        .ttl(Duration::from_secs(3600))
        .local_ttl(Duration::from_millis(150));
    cache.write("key1", "value1", &opts).await.unwrap();
    remote.clear().await.unwrap();

    // Before the local TTL elapses the local copy serves the read
    let entry = cache.read("key1", &local_opts()).await.unwrap().unwrap();
    assert_eq!(entry.value, Bytes::from("value1"));

    tokio::time::sleep(Duration::from_millis(250)).await;

    // After the local TTL elapses nothing is left anywhere
    assert!(cache.read("key1", &local_opts()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_backfill_uses_local_ttl() {
    let (cache, remote, _local) = build_cache();

    cache.write("key1", "value1", &no_opts()).await.unwrap();

    let opts = OperationOptions::new()
        .use_local(true)
        .local_ttl(Duration::from_millis(150));
    cache.read("key1", &opts).await.unwrap().unwrap();
    remote.clear().await.unwrap();

    assert!(cache.read("key1", &local_opts()).await.unwrap().is_some());
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(cache.read("key1", &local_opts()).await.unwrap().is_none());
}

// == Fetch Tests ==

#[tokio::test]
async fn test_fetch_returns_existing_without_compute() {
    let (cache, _remote, _local) = build_cache();

    cache.write("key1", "existing", &no_opts()).await.unwrap();

    let mut invoked = false;
    let value = cache
        .fetch("key1", &no_opts(), || {
            invoked = true;
            Bytes::from("new")
        })
        .await
        .unwrap();

    assert_eq!(value, Bytes::from("existing"));
    assert!(!invoked, "Compute must not run on a hit");
}

#[tokio::test]
async fn test_fetch_computes_and_stores_on_full_miss() {
    let (cache, remote, _local) = build_cache();

    let value = cache
        .fetch("key1", &local_opts(), || Bytes::from("computed"))
        .await
        .unwrap();
    assert_eq!(value, Bytes::from("computed"));

    // Remote outage: fetch stored through both tiers, local copy survives
    remote.clear().await.unwrap();
    let entry = cache.read("key1", &local_opts()).await.unwrap().unwrap();
    assert_eq!(entry.value, Bytes::from("computed"));
}

#[tokio::test]
async fn test_fetch_backfills_local_before_compute_decision() {
    let (cache, remote, local) = build_cache();

    cache.write("key1", "value1", &no_opts()).await.unwrap();
    assert!(local.is_empty().await);

    // Fetch misses local, hits remote: backfill happens, compute does not
    let value = cache
        .fetch("key1", &local_opts(), || Bytes::from("new"))
        .await
        .unwrap();
    assert_eq!(value, Bytes::from("value1"));
    assert_eq!(local.len().await, 1);

    remote.clear().await.unwrap();
    let value = cache
        .fetch("key1", &local_opts(), || Bytes::from("newer"))
        .await
        .unwrap();
    assert_eq!(value, Bytes::from("value1"));
}

// == Delete / Exists / Clear Tests ==

#[tokio::test]
async fn test_delete_removes_from_both_tiers() {
    let (cache, remote, local) = build_cache();

    cache.write("key1", "value1", &local_opts()).await.unwrap();
    assert!(cache.delete("key1").await.unwrap());

    assert!(cache.read("key1", &local_opts()).await.unwrap().is_none());
    assert!(remote.is_empty().await);
    assert!(local.is_empty().await);
}

#[tokio::test]
async fn test_exists_checks_remote() {
    let (cache, _remote, _local) = build_cache();

    assert!(!cache.exists("key1").await.unwrap());
    cache.write("key1", "value1", &no_opts()).await.unwrap();
    assert!(cache.exists("key1").await.unwrap());
}

#[tokio::test]
async fn test_clear_empties_both_tiers() {
    let (cache, remote, local) = build_cache();

    cache.write("key1", "v", &local_opts()).await.unwrap();
    cache.write("key2", "v", &local_opts()).await.unwrap();
    cache.clear().await.unwrap();

    assert!(remote.is_empty().await);
    assert!(local.is_empty().await);
}

// == Counter Tests ==

#[tokio::test]
async fn test_increment_and_decrement() {
    let (cache, _remote, _local) = build_cache();

    assert_eq!(cache.increment("counter", 1, &no_opts()).await.unwrap(), 1);
    assert_eq!(cache.increment("counter", 5, &no_opts()).await.unwrap(), 6);
    assert_eq!(cache.decrement("counter", 2, &no_opts()).await.unwrap(), 4);
}

#[tokio::test]
async fn test_counters_ignore_use_local() {
    let (cache, _remote, local) = build_cache();

    cache.increment("counter", 1, &local_opts()).await.unwrap();

    let in_local = local
        .get("counter", &BackendOptions::default())
        .await
        .unwrap();
    assert!(in_local.is_none(), "Counters must never touch the local tier");
}

// == Pattern Delete Tests ==

#[tokio::test]
async fn test_delete_matching_scopes_to_pattern_in_both_tiers() {
    let (cache, remote, local) = build_cache();

    cache.write("ns:1", "v", &local_opts()).await.unwrap();
    cache.write("ns:2", "v", &local_opts()).await.unwrap();
    cache.write("other:1", "v", &local_opts()).await.unwrap();

    let removed = cache.delete_matching("ns:*").await.unwrap();
    assert_eq!(removed, 2);

    for backend in [&remote, &local] {
        let opts = BackendOptions::default();
        assert!(backend.get("ns:1", &opts).await.unwrap().is_none());
        assert!(backend.get("ns:2", &opts).await.unwrap().is_none());
        assert!(backend.get("other:1", &opts).await.unwrap().is_some());
    }
}

// == Failure Policy Tests ==

fn build_flaky_cache() -> (
    TieredCache<Arc<FlakyBackend>, Arc<FlakyBackend>>,
    Arc<FlakyBackend>,
    Arc<FlakyBackend>,
) {
    let remote = Arc::new(FlakyBackend::new());
    let local = Arc::new(FlakyBackend::new());
    let cache = TieredCache::new(remote.clone(), local.clone());
    (cache, remote, local)
}

#[tokio::test]
async fn test_local_faults_never_fail_reads() {
    let (cache, _remote, local) = build_flaky_cache();

    cache.write("key1", "value1", &no_opts()).await.unwrap();
    local.set_failing(true);

    // Local get and backfill both fault; the read still serves remote
    let entry = cache.read("key1", &local_opts()).await.unwrap().unwrap();
    assert_eq!(entry.value, Bytes::from("value1"));
}

#[tokio::test]
async fn test_local_faults_never_fail_writes() {
    let (cache, _remote, local) = build_flaky_cache();
    local.set_failing(true);

    cache.write("key1", "value1", &local_opts()).await.unwrap();

    let entry = cache.read("key1", &no_opts()).await.unwrap().unwrap();
    assert_eq!(entry.value, Bytes::from("value1"));
}

#[tokio::test]
async fn test_local_faults_never_fail_maintenance_ops() {
    let (cache, _remote, local) = build_flaky_cache();

    cache.write("key1", "value1", &no_opts()).await.unwrap();
    local.set_failing(true);

    assert!(cache.delete("key1").await.unwrap());
    cache.clear().await.unwrap();
    assert_eq!(cache.delete_matching("*").await.unwrap(), 0);
    assert_eq!(cache.cleanup().await, 0);
}

#[tokio::test]
async fn test_remote_faults_surface_to_caller() {
    let (cache, remote, _local) = build_flaky_cache();
    remote.set_failing(true);

    let opts = local_opts();
    assert!(cache.read("key1", &opts).await.is_err());
    assert!(cache.write("key1", "v", &opts).await.is_err());
    assert!(cache.exists("key1").await.is_err());
    assert!(cache.increment("counter", 1, &opts).await.is_err());
    assert!(cache.delete("key1").await.is_err());
    assert!(cache.clear().await.is_err());
    assert!(cache.delete_matching("*").await.is_err());
}

#[tokio::test]
async fn test_remote_fault_skips_local_write_through() {
    let (cache, remote, local) = build_flaky_cache();
    remote.set_failing(true);

    assert!(cache.write("key1", "value1", &local_opts()).await.is_err());

    // The local tier must not hold a value the remote tier never accepted
    remote.set_failing(false);
    assert!(cache.read("key1", &local_opts()).await.unwrap().is_none());
    assert!(local.inner.is_empty().await);
}

#[tokio::test]
async fn test_local_hit_survives_remote_outage() {
    let (cache, remote, _local) = build_flaky_cache();

    cache.write("key1", "value1", &local_opts()).await.unwrap();
    remote.set_failing(true);

    // The local copy answers without ever reaching the faulted remote
    let entry = cache.read("key1", &local_opts()).await.unwrap().unwrap();
    assert_eq!(entry.value, Bytes::from("value1"));
}
