//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the lifetime of a
//! coordinator.
//!
//! # Tasks
//! - TTL Cleanup: sweeps expired local-tier entries at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
