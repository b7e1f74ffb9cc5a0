//! Memory Backend Module
//!
//! Bundled in-memory tier combining HashMap storage with LRU eviction and
//! TTL expiration. Normally used as the local tier, but it also implements
//! the remote contract so it can stand in for a shared store in tests and
//! single-process deployments.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use regex::Regex;
use tokio::sync::RwLock;

use crate::backend::{
    current_timestamp_ms, BackendStats, CacheBackend, CacheEntry, RemoteBackend, MAX_KEY_LENGTH,
    MAX_VALUE_SIZE,
};
use crate::config::MemoryConfig;
use crate::error::{CacheError, Result};
use crate::options::BackendOptions;

// == Access Order ==
/// Tracks key recency for LRU eviction.
///
/// Front = most recently used, back = least recently used.
#[derive(Debug, Default)]
struct AccessOrder {
    order: VecDeque<String>,
}

impl AccessOrder {
    /// Marks a key as most recently used.
    fn touch(&mut self, key: &str) {
        self.forget(key);
        self.order.push_front(key.to_string());
    }

    /// Drops a key from the tracker.
    fn forget(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    /// Removes and returns the least recently used key.
    fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    fn clear(&mut self) {
        self.order.clear();
    }
}

// == Memory State ==
/// Mutable interior of the backend, guarded by one RwLock.
#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, CacheEntry>,
    access: AccessOrder,
    stats: BackendStats,
}

impl MemoryState {
    /// Removes an entry and its recency record.
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.access.forget(key);
        }
        self.stats.set_entries(self.entries.len());
        removed
    }
}

// == Memory Backend ==
/// In-memory cache tier with size-bounded LRU eviction and TTL expiration.
#[derive(Debug)]
pub struct MemoryBackend {
    /// Guarded storage, recency order and stats
    state: RwLock<MemoryState>,
    /// Maximum number of entries before eviction kicks in
    max_entries: usize,
    /// TTL applied to writes that carry none
    default_ttl: Duration,
}

impl MemoryBackend {
    // == Constructor ==
    /// Creates a backend with the given capacity and default TTL.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            max_entries,
            default_ttl,
        }
    }

    /// Creates a backend from configuration.
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::new(
            config.max_entries,
            Duration::from_secs(config.default_ttl),
        )
    }

    // == Stats ==
    /// Returns a snapshot of the backend's performance statistics.
    pub async fn stats(&self) -> BackendStats {
        let state = self.state.read().await;
        let mut stats = state.stats.clone();
        stats.set_entries(state.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries (expired ones included until
    /// they are read or swept).
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Returns true if the backend holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}

// == Cache Backend Implementation ==
#[async_trait]
impl CacheBackend for MemoryBackend {
    /// Retrieves a value by key.
    ///
    /// Expired entries are dropped on read and counted as misses.
    async fn get(&self, key: &str, _options: &BackendOptions) -> Result<Option<CacheEntry>> {
        let mut state = self.state.write().await;

        match state.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                state.remove(key);
                state.stats.record_expirations(1);
                state.stats.record_miss();
                Ok(None)
            }
            Some(entry) => {
                let entry = entry.clone();
                state.stats.record_hit();
                state.access.touch(key);
                Ok(Some(entry))
            }
            None => {
                state.stats.record_miss();
                Ok(None)
            }
        }
    }

    /// Stores an entry under a key, rebuilding its expiry from `ttl` (or
    /// the backend default). Overwrites reset the TTL; at-capacity inserts
    /// evict the least recently used key first.
    async fn put(
        &self,
        key: &str,
        entry: &CacheEntry,
        ttl: Option<Duration>,
        _options: &BackendOptions,
    ) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if entry.value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        let mut state = self.state.write().await;

        let is_overwrite = state.entries.contains_key(key);
        if !is_overwrite && state.entries.len() >= self.max_entries {
            if let Some(evicted) = state.access.pop_oldest() {
                state.entries.remove(&evicted);
                state.stats.record_eviction();
            } else {
                return Err(CacheError::CacheFull(
                    "Backend is full and eviction failed".to_string(),
                ));
            }
        }

        let effective_ttl = ttl.unwrap_or(self.default_ttl);
        let stored = CacheEntry::new(entry.value.clone(), Some(effective_ttl));

        state.entries.insert(key.to_string(), stored);
        state.access.touch(key);
        let len = state.entries.len();
        state.stats.set_entries(len);

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.remove(key).is_some())
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.access.clear();
        state.stats.set_entries(0);
        Ok(())
    }

    /// Removes all keys matching a glob pattern (`*` and `?` wildcards).
    async fn delete_matching(&self, pattern: &str) -> Result<usize> {
        let matcher = glob_to_regex(pattern)?;
        let mut state = self.state.write().await;

        let matching: Vec<String> = state
            .entries
            .keys()
            .filter(|key| matcher.is_match(key))
            .cloned()
            .collect();

        for key in &matching {
            state.remove(key);
        }

        Ok(matching.len())
    }

    /// Removes all expired entries and returns how many were dropped.
    async fn cleanup(&self) -> Result<usize> {
        let mut state = self.state.write().await;

        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            state.remove(key);
        }
        state.stats.record_expirations(expired.len() as u64);

        Ok(expired.len())
    }
}

// == Remote Backend Implementation ==
#[async_trait]
impl RemoteBackend for MemoryBackend {
    /// Non-expired presence check. Does not touch recency or stats.
    async fn exists(&self, key: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false))
    }

    /// Adds `amount` to the ASCII integer stored at `key`, atomically
    /// within this backend's lock. A missing or expired key counts from
    /// zero; an existing entry keeps its expiry across increments.
    async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        let mut state = self.state.write().await;

        let (current, expires_at) = match state.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                state.remove(key);
                state.stats.record_expirations(1);
                (0, None)
            }
            Some(entry) => {
                let text = std::str::from_utf8(&entry.value).map_err(|_| {
                    CacheError::InvalidRequest(format!("Value at '{}' is not an integer", key))
                })?;
                let current: i64 = text.trim().parse().map_err(|_| {
                    CacheError::InvalidRequest(format!("Value at '{}' is not an integer", key))
                })?;
                (current, entry.expires_at)
            }
            None => (0, None),
        };

        let next = current + amount;
        let stored = CacheEntry {
            value: Bytes::from(next.to_string()),
            created_at: current_timestamp_ms(),
            expires_at,
        };

        state.entries.insert(key.to_string(), stored);
        state.access.touch(key);
        let len = state.entries.len();
        state.stats.set_entries(len);

        Ok(next)
    }
}

// == Glob Compilation ==
/// Compiles a glob-style pattern (`*`, `?`) into an anchored regex.
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut body = String::with_capacity(pattern.len() * 2);
    for ch in pattern.chars() {
        match ch {
            '*' => body.push_str(".*"),
            '?' => body.push('.'),
            _ => body.push_str(&regex::escape(&ch.to_string())),
        }
    }

    Regex::new(&format!("^{}$", body))
        .map_err(|err| CacheError::InvalidRequest(format!("Bad pattern '{}': {}", pattern, err)))
}
