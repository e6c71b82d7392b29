//! Roost Pool - Application-instance pooling.
//!
//! This crate multiplexes request sessions onto a bounded set of
//! long-lived worker processes, one group per application root:
//!
//! - Admission and dispatch with per-application and global caps
//! - LRU eviction of idle workers to make room for new applications
//! - Restart detection via trigger files in the application tree
//! - Per-worker request quotas and idle retirement
//! - Plain-text and XML introspection snapshots
//!
//! The spawning subsystem is a collaborator behind the [`Spawner`]
//! trait; the pool never starts processes itself.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod options;
pub mod pool;
mod registry;
pub mod restart;
pub mod snapshot;
pub mod spawn;

// Re-export key types at crate root for convenience
pub use options::PoolOptions;
pub use pool::{
    Pool, DEFAULT_MAX_IDLE_TIME, DEFAULT_MAX_INSTANCES_PER_APP, DEFAULT_MAX_POOL_SIZE,
};
pub use restart::RestartDetector;
pub use roost_core::{Result, RoostError};
pub use snapshot::{GroupSnapshot, PoolSnapshot, ProcessSnapshot};
pub use spawn::{CloseCallback, Session, SpawnError, Spawner, WorkerChannel, WorkerHandle};
