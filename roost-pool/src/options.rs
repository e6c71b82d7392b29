//! Per-request pool options.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options governing how `Pool::get` treats one request.
///
/// Only `app_root` is required; everything else has a conservative
/// default. The same options value is normally built once per virtual
/// host and reused for every request to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolOptions {
    /// Filesystem path identifying the application; doubles as the
    /// group key inside the pool.
    pub app_root: String,

    /// Overrides the directory probed for restart trigger files.
    ///
    /// `None` means `<app_root>/tmp`. An absolute path is used as-is; a
    /// relative path is joined to `app_root`.
    #[serde(default)]
    pub restart_dir: Option<PathBuf>,

    /// Minimum number of seconds between filesystem probes for the
    /// restart trigger files. `0` probes on every request.
    #[serde(default)]
    pub stat_throttle_rate: u64,

    /// When the per-application or global cap is reached, wait for a
    /// worker to free up instead of multiplexing onto a busy one.
    #[serde(default)]
    pub use_global_queue: bool,

    /// Number of requests a worker may serve before it is retired.
    /// `0` means unbounded.
    #[serde(default)]
    pub max_requests: u64,
}

impl PoolOptions {
    /// Create options for the given application root with defaults for
    /// everything else.
    pub fn new(app_root: impl Into<String>) -> Self {
        Self {
            app_root: app_root.into(),
            restart_dir: None,
            stat_throttle_rate: 0,
            use_global_queue: false,
            max_requests: 0,
        }
    }

    /// Override the restart trigger directory.
    #[must_use]
    pub fn with_restart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.restart_dir = Some(dir.into());
        self
    }

    /// Set the minimum interval between restart-file probes, in seconds.
    #[must_use]
    pub fn with_stat_throttle_rate(mut self, seconds: u64) -> Self {
        self.stat_throttle_rate = seconds;
        self
    }

    /// Enable or disable global-queue waiting.
    #[must_use]
    pub fn with_global_queue(mut self, enabled: bool) -> Self {
        self.use_global_queue = enabled;
        self
    }

    /// Set the per-worker lifetime request cap (`0` = unbounded).
    #[must_use]
    pub fn with_max_requests(mut self, max_requests: u64) -> Self {
        self.max_requests = max_requests;
        self
    }
}
