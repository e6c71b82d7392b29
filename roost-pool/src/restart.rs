//! Restart trigger detection.
//!
//! An application asks to be restarted by placing files in its restart
//! directory (by default `<app_root>/tmp`): `always_restart.txt` forces a
//! restart on every request while it exists; touching `restart.txt`
//! requests a one-shot restart. Both probes are filesystem stats and can
//! be throttled per request via `PoolOptions::stat_throttle_rate`, in
//! which case the previous answer is served from cache until the interval
//! elapses.

use crate::options::PoolOptions;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

const ALWAYS_RESTART_FILE: &str = "always_restart.txt";
const RESTART_FILE: &str = "restart.txt";

/// Resolve the directory probed for restart trigger files.
pub(crate) fn resolve_restart_dir(app_root: &str, override_dir: Option<&Path>) -> PathBuf {
    match override_dir {
        None => Path::new(app_root).join("tmp"),
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => Path::new(app_root).join(dir),
    }
}

#[derive(Debug)]
struct StatEntry {
    checked_at: Instant,
    exists: bool,
}

#[derive(Debug, Default)]
struct ChangeEntry {
    checked_at: Option<Instant>,
    mtime: Option<SystemTime>,
    last_answer: bool,
}

/// Decides whether an application group must be discarded and respawned.
///
/// Probe results are cached per path; the cache is never dropped when a
/// group restarts, so a throttled probe can outlive the group it was made
/// for.
#[derive(Debug, Default)]
pub struct RestartDetector {
    always: HashMap<PathBuf, StatEntry>,
    changes: HashMap<PathBuf, ChangeEntry>,
}

impl RestartDetector {
    /// Create a detector with empty probe caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the group for `options.app_root` must be restarted.
    pub fn needs_restart(&mut self, options: &PoolOptions) -> bool {
        let dir = resolve_restart_dir(&options.app_root, options.restart_dir.as_deref());
        let throttle = Duration::from_secs(options.stat_throttle_rate);
        // Both probes run unconditionally so their caches stay warm.
        let always = self.file_exists(dir.join(ALWAYS_RESTART_FILE), throttle);
        let changed = self.file_changed(dir.join(RESTART_FILE), throttle);
        always || changed
    }

    fn file_exists(&mut self, path: PathBuf, throttle: Duration) -> bool {
        if let Some(entry) = self.always.get(&path) {
            if entry.checked_at.elapsed() < throttle {
                return entry.exists;
            }
        }
        let exists = fs::metadata(&path).is_ok();
        self.always.insert(
            path,
            StatEntry {
                checked_at: Instant::now(),
                exists,
            },
        );
        exists
    }

    /// Whether `path` changed since the previous unthrottled observation.
    ///
    /// The first observation of a path records its state and reports no
    /// change; a change is a transition between two observations
    /// (created, deleted, or modified in between).
    fn file_changed(&mut self, path: PathBuf, throttle: Duration) -> bool {
        let entry = self.changes.entry(path.clone()).or_default();
        if let Some(checked_at) = entry.checked_at {
            if checked_at.elapsed() < throttle {
                return entry.last_answer;
            }
        }
        let mtime = fs::metadata(&path).ok().and_then(|m| m.modified().ok());
        let changed = entry.checked_at.is_some() && mtime != entry.mtime;
        if changed {
            tracing::debug!(path = %path.display(), "restart trigger file changed");
        }
        entry.checked_at = Some(Instant::now());
        entry.mtime = mtime;
        entry.last_answer = changed;
        changed
    }
}
