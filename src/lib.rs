//! Tiered Cache - a two-tier cache coordinator
//!
//! A process-local memory tier accelerates an authoritative remote tier.
//! Callers opt into the local tier per operation; its presence changes
//! latency, never correctness.

pub mod backend;
pub mod config;
pub mod error;
pub mod options;
pub mod tasks;
pub mod tiered;

pub use backend::{CacheBackend, CacheEntry, MemoryBackend, RemoteBackend};
pub use config::MemoryConfig;
pub use error::{CacheError, Result};
pub use options::{BackendOptions, OperationOptions};
pub use tasks::spawn_cleanup_task;
pub use tiered::TieredCache;
