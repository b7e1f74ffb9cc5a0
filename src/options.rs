//! Operation Options Module
//!
//! Per-call configuration for coordinator operations. Coordinator-only
//! fields (`use_local`, `local_ttl`, `ttl`) are stripped before anything
//! reaches a backend; `backend_options()` is the projection that enforces
//! this at the type level.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

// == Backend Options ==
/// Options forwarded verbatim to whichever backend(s) an operation consults.
///
/// The coordinator never interprets these; backends may reject or ignore
/// them per their own contract.
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    /// Raw-value mode: the backend should skip its own payload framing
    pub raw: bool,
    /// Backend-specific extras, passed through untouched
    pub extras: HashMap<String, Value>,
}

// == Operation Options ==
/// Per-call configuration for a coordinator operation.
///
/// Built with field setters:
/// ```
/// use std::time::Duration;
/// use tiered_cache::OperationOptions;
///
/// let opts = OperationOptions::new()
///     .use_local(true)
///     .local_ttl(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OperationOptions {
    /// Read/write path also consults/populates the local backend
    pub use_local: bool,
    /// TTL applied when writing into the local backend
    pub local_ttl: Option<Duration>,
    /// TTL applied to the remote backend write
    pub ttl: Option<Duration>,
    /// Pass-through options for the backends
    pub backend: BackendOptions,
}

impl OperationOptions {
    // == Constructor ==
    /// Creates options with all defaults (remote-only, backend-default TTLs).
    pub fn new() -> Self {
        Self::default()
    }

    // == Use Local ==
    /// Sets whether the local tier participates in reads and writes.
    pub fn use_local(mut self, use_local: bool) -> Self {
        self.use_local = use_local;
        self
    }

    // == Local TTL ==
    /// Sets the TTL for local-tier writes, independent of the remote TTL.
    pub fn local_ttl(mut self, ttl: Duration) -> Self {
        self.local_ttl = Some(ttl);
        self
    }

    // == Remote TTL ==
    /// Sets the TTL for remote-tier writes.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    // == Raw Mode ==
    /// Enables raw-value mode on the backend pass-through options.
    pub fn raw(mut self, raw: bool) -> Self {
        self.backend.raw = raw;
        self
    }

    // == Extra ==
    /// Adds a backend-specific pass-through option.
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.backend.extras.insert(key.into(), value);
        self
    }

    // == Backend Projection ==
    /// Returns the options a backend is allowed to see.
    ///
    /// Coordinator-only fields do not exist on the returned type, so they
    /// cannot leak into a backend call.
    pub fn backend_options(&self) -> &BackendOptions {
        &self.backend
    }
}
