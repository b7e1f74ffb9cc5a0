//! Backend Module
//!
//! Defines the tier contracts (`CacheBackend`, `RemoteBackend`) and the
//! bundled in-memory implementation.
//!
//! The coordinator owns one implementation of each contract and routes
//! every operation between them; backends are interchangeable as long as
//! they honor these traits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::options::BackendOptions;

mod entry;
mod memory;
mod stats;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use memory::MemoryBackend;
pub use stats::BackendStats;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

// == Cache Backend Trait ==
/// Contract every cache tier must satisfy.
///
/// Thread safety of concurrent access is the backend's own responsibility;
/// the coordinator adds no locking on top.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Retrieves a non-expired entry, or None on a miss.
    async fn get(&self, key: &str, options: &BackendOptions) -> Result<Option<CacheEntry>>;

    /// Stores an entry. The backend derives its own absolute expiry from
    /// `ttl` (falling back to its default when None).
    async fn put(
        &self,
        key: &str,
        entry: &CacheEntry,
        ttl: Option<Duration>,
        options: &BackendOptions,
    ) -> Result<()>;

    /// Removes a key. Deleting an absent key is a no-op; returns whether
    /// an entry was actually removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every entry.
    async fn clear(&self) -> Result<()>;

    /// Removes all keys matching a glob-style pattern, interpreted by the
    /// backend's own matching semantics. Returns the number removed.
    async fn delete_matching(&self, pattern: &str) -> Result<usize>;

    /// Expunges expired entries. Returns the number removed.
    async fn cleanup(&self) -> Result<usize>;
}

// == Remote Backend Trait ==
/// Additional contract for the authoritative tier: existence checks and
/// atomic counters, which need a single cross-process sequence point.
#[async_trait]
pub trait RemoteBackend: CacheBackend {
    /// Authoritative existence check.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Atomically adds `amount` to the integer value at `key` and returns
    /// the new value. A missing key starts from zero.
    async fn increment(&self, key: &str, amount: i64) -> Result<i64>;

    /// Atomically subtracts `amount`; equivalent to `increment(-amount)`.
    async fn decrement(&self, key: &str, amount: i64) -> Result<i64> {
        self.increment(key, -amount).await
    }
}

// == Arc Forwarding ==
// A shared `Arc` handle is usable directly as a backend, so one instance
// can be held by the coordinator and by other holders at the same time.
#[async_trait]
impl<T: CacheBackend + ?Sized> CacheBackend for Arc<T> {
    async fn get(&self, key: &str, options: &BackendOptions) -> Result<Option<CacheEntry>> {
        (**self).get(key, options).await
    }

    async fn put(
        &self,
        key: &str,
        entry: &CacheEntry,
        ttl: Option<Duration>,
        options: &BackendOptions,
    ) -> Result<()> {
        (**self).put(key, entry, ttl, options).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key).await
    }

    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }

    async fn delete_matching(&self, pattern: &str) -> Result<usize> {
        (**self).delete_matching(pattern).await
    }

    async fn cleanup(&self) -> Result<usize> {
        (**self).cleanup().await
    }
}

#[async_trait]
impl<T: RemoteBackend + ?Sized> RemoteBackend for Arc<T> {
    async fn exists(&self, key: &str) -> Result<bool> {
        (**self).exists(key).await
    }

    async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        (**self).increment(key, amount).await
    }

    async fn decrement(&self, key: &str, amount: i64) -> Result<i64> {
        (**self).decrement(key, amount).await
    }
}
