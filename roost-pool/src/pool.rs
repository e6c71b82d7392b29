//! The application-instance pool.
//!
//! One `Pool` multiplexes request sessions onto a bounded set of worker
//! processes, grouped by application root. A single mutex serializes all
//! bookkeeping; `get` may suspend in exactly two places (waiting for
//! capacity on the `active_or_max_changed` condition, and during the
//! spawner call, for which the mutex is released so other requests keep
//! dispatching). A background reaper thread retires workers that have
//! been idle too long.
//!
//! The pool is strictly single-process: its state lives on the heap and
//! it owns a thread, neither of which survives `fork`.

use crate::options::PoolOptions;
use crate::registry::{Group, IdleLink, LinkedList, ProcessInfo, ProcessRef, ProcessTable};
use crate::restart::RestartDetector;
use crate::snapshot::{GroupSnapshot, PoolSnapshot, ProcessSnapshot};
use crate::spawn::{Session, Spawner, WorkerHandle};
use parking_lot::{Condvar, Mutex, MutexGuard};
use roost_core::{Result, RoostError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default global cap on the number of worker processes.
pub const DEFAULT_MAX_POOL_SIZE: u32 = 20;

/// Default per-application cap (`0` = unbounded).
pub const DEFAULT_MAX_INSTANCES_PER_APP: u32 = 0;

/// Default number of seconds a worker may sit idle before the reaper
/// retires it.
pub const DEFAULT_MAX_IDLE_TIME: u64 = 120;

/// Checkout attempts before a failing spawn or handshake is surfaced.
const MAX_GET_ATTEMPTS: u32 = 10;

/// Everything the pool lock protects.
struct PoolState {
    groups: BTreeMap<String, Group>,
    table: ProcessTable,
    /// Cross-group list of workers with zero sessions, oldest-idle first.
    idle: LinkedList<IdleLink>,
    max: u32,
    max_per_app: u32,
    count: u32,
    active: u32,
    waiting_on_global_queue: u32,
    max_idle_time: Duration,
    done: bool,
}

/// State shared between the pool, its reaper thread, and outstanding
/// session-close callbacks (whose lifetime can exceed a checkout).
struct SharedData {
    state: Mutex<PoolState>,
    /// Broadcast on every structural change: releases, retirements,
    /// evictions, restarts, and cap changes.
    active_or_max_changed: Condvar,
    /// Wakes the reaper on destruction and `max_idle_time` changes.
    reaper_wakeup: Condvar,
}

impl PoolState {
    fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
            table: ProcessTable::new(),
            idle: LinkedList::new(),
            max: DEFAULT_MAX_POOL_SIZE,
            max_per_app: DEFAULT_MAX_INSTANCES_PER_APP,
            count: 0,
            active: 0,
            waiting_on_global_queue: 0,
            max_idle_time: Duration::from_secs(DEFAULT_MAX_IDLE_TIME),
            done: false,
        }
    }

    /// Claim the group's front process if it is session-free: off the
    /// idle list, to the tail of the group list, counted active.
    fn claim_front_free(&mut self, app_root: &str) -> Option<usize> {
        let group = self.groups.get_mut(app_root)?;
        let front = group.processes.head()?;
        if self.table.get(front).sessions != 0 {
            return None;
        }
        group.processes.unlink(&mut self.table, front);
        group.processes.push_back(&mut self.table, front);
        self.idle.unlink(&mut self.table, front);
        self.active += 1;
        Some(front)
    }

    /// Pick the group member with the fewest sessions (ties: earliest
    /// list position) and move it to the tail.
    fn multiplex_least_loaded(&mut self, app_root: &str) -> Option<usize> {
        let group = self.groups.get_mut(app_root)?;
        let mut best = group.processes.head()?;
        let mut best_sessions = self.table.get(best).sessions;
        for slot in group.processes.iter(&self.table).skip(1) {
            let sessions = self.table.get(slot).sessions;
            if sessions < best_sessions {
                best = slot;
                best_sessions = sessions;
            }
        }
        group.processes.unlink(&mut self.table, best);
        group.processes.push_back(&mut self.table, best);
        Some(best)
    }

    /// Register a freshly spawned worker at the tail of its group,
    /// creating the group if the spawn outlived it.
    fn insert_process(
        &mut self,
        app_root: &str,
        worker: Arc<dyn WorkerHandle>,
        max_requests: u64,
    ) -> usize {
        let slot = self.table.insert(ProcessInfo::new(worker));
        let group = self
            .groups
            .entry(app_root.to_string())
            .or_insert_with(|| Group::new(max_requests));
        group.processes.push_back(&mut self.table, slot);
        group.size += 1;
        self.count += 1;
        self.active += 1;
        slot
    }

    fn begin_session(&mut self, slot: usize) {
        let info = self.table.get_mut(slot);
        info.last_used = Instant::now();
        info.sessions += 1;
    }

    /// Unlink `slot` from its group, shrink it, and drop the group when
    /// it empties. Does not touch the idle list or the pool counters.
    fn retire_from_group(&mut self, slot: usize, app_root: &str) {
        if let Some(group) = self.groups.get_mut(app_root) {
            group.processes.unlink(&mut self.table, slot);
            group.size -= 1;
            if group.processes.is_empty() {
                self.groups.remove(app_root);
            }
        }
    }

    /// Throw away an entire group, e.g. because it must be restarted.
    fn discard_group(&mut self, app_root: &str) {
        let Some(mut group) = self.groups.remove(app_root) else {
            return;
        };
        while let Some(slot) = group.processes.pop_front(&mut self.table) {
            let sessions = self.table.get(slot).sessions;
            if sessions == 0 {
                self.idle.unlink(&mut self.table, slot);
            } else {
                self.active -= 1;
            }
            self.count -= 1;
            let info = self.table.remove(slot);
            tracing::debug!(
                app_root = %app_root,
                pid = info.worker.pid(),
                "retired worker for group restart"
            );
        }
    }

    /// Make room for a new application by retiring the worker that has
    /// been idle the longest, whichever group it belongs to.
    fn evict_oldest_idle(&mut self) {
        let Some(slot) = self.idle.pop_front(&mut self.table) else {
            tracing::error!("eviction requested with no idle workers");
            return;
        };
        let app_root = self.table.get(slot).worker.app_root().to_string();
        self.retire_from_group(slot, &app_root);
        self.count -= 1;
        let info = self.table.remove(slot);
        tracing::debug!(
            app_root = %app_root,
            pid = info.worker.pid(),
            "evicted least-recently-used idle worker"
        );
    }

    /// Bookkeeping for one closed session. Returns whether waiters must
    /// be notified.
    fn release_session(&mut self, slot: usize, app_root: &str) -> bool {
        let max_requests = match self.groups.get(app_root) {
            Some(group) => group.max_requests,
            None => {
                tracing::warn!(app_root = %app_root, "session closed for an unknown group");
                return false;
            }
        };

        let info = self.table.get_mut(slot);
        info.processed += 1;
        let processed = info.processed;

        if max_requests > 0 && processed >= max_requests {
            let pid = info.worker.pid();
            self.retire_from_group(slot, app_root);
            self.count -= 1;
            self.active -= 1;
            self.table.remove(slot);
            tracing::debug!(
                app_root = %app_root,
                pid,
                processed,
                "worker reached its request quota"
            );
            return true;
        }

        info.sessions -= 1;
        if info.sessions > 0 {
            return false;
        }
        info.last_used = Instant::now();
        if let Some(group) = self.groups.get_mut(app_root) {
            group.processes.unlink(&mut self.table, slot);
            group.processes.push_front(&mut self.table, slot);
        }
        self.idle.push_back(&mut self.table, slot);
        self.active -= 1;
        true
    }

    /// Undo a checkout whose session handshake failed: the worker is
    /// dropped entirely rather than requeued.
    fn unwind_failed_connect(&mut self, slot: usize, app_root: &str) {
        self.table.get_mut(slot).sessions -= 1;
        self.retire_from_group(slot, app_root);
        self.count -= 1;
        self.active -= 1;
        self.table.remove(slot);
    }

    /// Retire every idle worker whose last use is older than `max_idle`.
    fn reap_idle(&mut self, now: Instant, max_idle: Duration) {
        let mut cursor = self.idle.head();
        while let Some(slot) = cursor {
            cursor = self.idle.next_of(&self.table, slot);
            let info = self.table.get(slot);
            if now.duration_since(info.last_used) <= max_idle {
                continue;
            }
            let app_root = info.worker.app_root().to_string();
            let pid = info.worker.pid();
            self.idle.unlink(&mut self.table, slot);
            self.retire_from_group(slot, &app_root);
            self.count -= 1;
            self.table.remove(slot);
            tracing::debug!(app_root = %app_root, pid, "retired idle worker");
        }
    }

    fn snapshot(&self) -> PoolSnapshot {
        let now = Instant::now();
        PoolSnapshot {
            max: self.max,
            count: self.count,
            active: self.active,
            inactive: self.idle.len() as u32,
            waiting_on_global_queue: self.waiting_on_global_queue,
            groups: self
                .groups
                .iter()
                .map(|(app_root, group)| GroupSnapshot {
                    app_root: app_root.clone(),
                    processes: group
                        .processes
                        .iter(&self.table)
                        .map(|slot| {
                            let info = self.table.get(slot);
                            ProcessSnapshot {
                                pid: info.worker.pid(),
                                sessions: info.sessions,
                                processed: info.processed,
                                uptime_secs: now.duration_since(info.start_time).as_secs(),
                            }
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Verify every cross-collection invariant. Debug builds only;
    /// release builds carry on with the last consistent state.
    fn assert_invariants(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        let mut total_size = 0u32;
        for (app_root, group) in &self.groups {
            assert!(
                !group.processes.is_empty(),
                "group '{}' has no processes",
                app_root
            );
            assert_eq!(
                group.size as usize,
                group.processes.len(),
                "group '{}' size counter",
                app_root
            );
            group.processes.assert_well_formed(&self.table);
            total_size += group.size;

            let mut seen_active = false;
            for slot in group.processes.iter(&self.table) {
                let sessions = self.table.get(slot).sessions;
                if sessions > 0 {
                    seen_active = true;
                } else {
                    assert!(
                        !seen_active,
                        "group '{}' is not sorted session-free first",
                        app_root
                    );
                }
                assert_eq!(
                    self.idle.contains(&self.table, slot),
                    sessions == 0,
                    "idle membership of pid {}",
                    self.table.get(slot).worker.pid()
                );
            }
        }
        assert_eq!(total_size, self.count, "sum of group sizes equals count");
        assert_eq!(
            self.table.len() as u32,
            self.count,
            "table population equals count"
        );
        assert!(self.active <= self.count, "active exceeds count");
        assert_eq!(
            self.idle.len() as u32,
            self.count - self.active,
            "idle length equals count minus active"
        );
        self.idle.assert_well_formed(&self.table);
    }
}

/// Fired when a session ends. Holds a weak process handle so a worker
/// retired in the meantime is left alone.
struct SessionCloseHandler {
    shared: Arc<SharedData>,
    process: ProcessRef,
    app_root: String,
}

impl SessionCloseHandler {
    /// Never propagates errors; a session teardown must not double-fault.
    fn run(self) {
        let mut state = self.shared.state.lock();
        let Some(slot) = state.table.resolve(self.process) else {
            return;
        };
        if state.release_session(slot, &self.app_root) {
            self.shared.active_or_max_changed.notify_all();
        }
        state.assert_invariants();
    }
}

/// A thread-safe pool of long-lived worker processes, one group per
/// application root.
///
/// See the [module documentation](self) for the concurrency model.
pub struct Pool {
    shared: Arc<SharedData>,
    spawner: Arc<dyn Spawner>,
    restart: Mutex<RestartDetector>,
    reaper: Option<thread::JoinHandle<()>>,
}

impl Pool {
    /// Create a pool dispatching onto workers produced by `spawner`.
    pub fn new(spawner: Arc<dyn Spawner>) -> Self {
        let shared = Arc::new(SharedData {
            state: Mutex::new(PoolState::new()),
            active_or_max_changed: Condvar::new(),
            reaper_wakeup: Condvar::new(),
        });
        let reaper = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("roost-idle-reaper".to_string())
                .spawn(move || reaper_main(shared))
                .expect("failed to start the idle reaper thread")
        };
        Self {
            shared,
            spawner,
            restart: Mutex::new(RestartDetector::new()),
            reaper: Some(reaper),
        }
    }

    /// Obtain a session bound to a worker for `options.app_root`.
    ///
    /// Blocks while the pool is at capacity (or, with
    /// `use_global_queue`, while the application's own cap is reached).
    /// Spawn and handshake failures are retried up to an internal budget
    /// before surfacing.
    pub fn get(&self, options: &PoolOptions) -> Result<Session> {
        let mut state = self.shared.state.lock();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let slot = match self.checkout(&mut state, options) {
                Ok(slot) => slot,
                Err(err) => {
                    if attempt >= MAX_GET_ATTEMPTS {
                        return Err(err);
                    }
                    tracing::warn!(
                        app_root = %options.app_root,
                        attempt,
                        error = %err,
                        "worker spawn failed; retrying"
                    );
                    continue;
                }
            };
            state.assert_invariants();

            let worker = Arc::clone(&state.table.get(slot).worker);
            let close = SessionCloseHandler {
                shared: Arc::clone(&self.shared),
                process: state.table.handle(slot),
                app_root: options.app_root.clone(),
            };
            match worker.connect(Box::new(move || close.run())) {
                Ok(session) => {
                    tracing::debug!(
                        app_root = %options.app_root,
                        pid = session.pid(),
                        "session checked out"
                    );
                    return Ok(session);
                }
                Err(err) => {
                    state.unwind_failed_connect(slot, &options.app_root);
                    self.shared.active_or_max_changed.notify_all();
                    state.assert_invariants();
                    if attempt >= MAX_GET_ATTEMPTS {
                        return Err(RoostError::ConnectFailed {
                            app_root: options.app_root.clone(),
                            attempts: attempt,
                            cause: err.to_string(),
                        });
                    }
                    tracing::warn!(
                        app_root = %options.app_root,
                        attempt,
                        error = %err,
                        "worker refused the session handshake; retrying"
                    );
                }
            }
        }
    }

    /// Choose or spawn a worker for the request and mark a session on
    /// it. Runs under the pool lock; suspends only on the capacity
    /// condition and for the spawner call itself.
    fn checkout(
        &self,
        state: &mut MutexGuard<'_, PoolState>,
        options: &PoolOptions,
    ) -> Result<usize> {
        let app_root = options.app_root.as_str();
        loop {
            if self.restart.lock().needs_restart(options) {
                tracing::info!(app_root = %app_root, "restarting application group");
                state.discard_group(app_root);
                self.spawner.reload(app_root);
                self.shared.active_or_max_changed.notify_all();
            }

            let group_size = state.groups.get(app_root).map(|group| group.size);
            if let Some(group_size) = group_size {
                if let Some(slot) = state.claim_front_free(app_root) {
                    self.shared.active_or_max_changed.notify_all();
                    state.begin_session(slot);
                    return Ok(slot);
                }

                let at_capacity = state.count >= state.max
                    || (state.max_per_app != 0 && group_size >= state.max_per_app);
                if at_capacity {
                    if options.use_global_queue {
                        state.waiting_on_global_queue += 1;
                        self.shared.active_or_max_changed.wait(state);
                        state.waiting_on_global_queue -= 1;
                        continue;
                    }
                    let slot = state
                        .multiplex_least_loaded(app_root)
                        .expect("a known group has processes to multiplex onto");
                    state.begin_session(slot);
                    return Ok(slot);
                }

                // Room for one more worker in an existing group.
                let worker = self.spawn_unlocked(state, options)?;
                let slot = state.insert_process(app_root, worker, options.max_requests);
                self.shared.active_or_max_changed.notify_all();
                state.begin_session(slot);
                return Ok(slot);
            }

            // First request for this application.
            if state.active >= state.max {
                self.shared.active_or_max_changed.wait(state);
                continue;
            }
            if state.count == state.max {
                state.evict_oldest_idle();
            }
            let worker = self.spawn_unlocked(state, options)?;
            let slot = state.insert_process(app_root, worker, options.max_requests);
            self.shared.active_or_max_changed.notify_all();
            state.begin_session(slot);
            return Ok(slot);
        }
    }

    /// Call into the spawner with the pool mutex released, so other
    /// requests keep dispatching while a worker boots.
    fn spawn_unlocked(
        &self,
        state: &mut MutexGuard<'_, PoolState>,
        options: &PoolOptions,
    ) -> Result<Arc<dyn WorkerHandle>> {
        let spawner = Arc::clone(&self.spawner);
        MutexGuard::unlocked(state, || spawner.spawn(options)).map_err(|err| {
            RoostError::SpawnFailed {
                app_root: options.app_root.clone(),
                cause: err.message,
                error_page: err.error_page,
            }
        })
    }

    /// Drop every group and worker and wake all waiters.
    pub fn clear(&self) {
        // TODO: also flush the restart detector's cached probes and ask
        // the spawner to reload every known root, so a get() right after
        // clear() cannot act on a stale throttled probe.
        let mut state = self.shared.state.lock();
        state.groups.clear();
        state.idle.clear();
        state.table.clear();
        state.count = 0;
        state.active = 0;
        self.shared.active_or_max_changed.notify_all();
    }

    /// Change the global worker cap and wake all waiters.
    pub fn set_max(&self, max: u32) {
        let mut state = self.shared.state.lock();
        state.max = max;
        self.shared.active_or_max_changed.notify_all();
    }

    /// Change the per-application cap (`0` = unbounded) and wake all
    /// waiters.
    pub fn set_max_per_app(&self, max_per_app: u32) {
        let mut state = self.shared.state.lock();
        state.max_per_app = max_per_app;
        self.shared.active_or_max_changed.notify_all();
    }

    /// Change the idle retirement threshold and reschedule the reaper.
    pub fn set_max_idle_time(&self, seconds: u64) {
        let mut state = self.shared.state.lock();
        state.max_idle_time = Duration::from_secs(seconds);
        self.shared.reaper_wakeup.notify_one();
    }

    /// Number of workers with at least one active session.
    pub fn active(&self) -> u32 {
        self.shared.state.lock().active
    }

    /// Total number of workers in the pool.
    pub fn count(&self) -> u32 {
        self.shared.state.lock().count
    }

    /// PID of the spawn server backing this pool.
    pub fn spawn_server_pid(&self) -> u32 {
        self.spawner.server_pid()
    }

    /// Capture a consistent snapshot of the pool under the lock.
    pub fn snapshot(&self) -> PoolSnapshot {
        self.shared.state.lock().snapshot()
    }

    /// Operator-facing plain-text state dump.
    pub fn inspect(&self) -> String {
        self.snapshot().render_text()
    }

    /// Structured XML state dump.
    pub fn to_xml(&self, include_sensitive: bool) -> String {
        self.snapshot().to_xml(include_sensitive)
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.done = true;
            self.shared.reaper_wakeup.notify_one();
        }
        if let Some(reaper) = self.reaper.take() {
            if reaper.join().is_err() {
                tracing::error!("idle reaper thread panicked");
            }
        }
    }
}

/// Reaper loop: sleep on the wakeup condition, scan the idle list on
/// timeout, re-read the configuration on wakeup, exit on `done`.
fn reaper_main(shared: Arc<SharedData>) {
    let mut state = shared.state.lock();
    loop {
        if state.done {
            break;
        }
        let timeout = state.max_idle_time + Duration::from_secs(1);
        let result = shared.reaper_wakeup.wait_for(&mut state, timeout);
        if !result.timed_out() {
            if state.done {
                break;
            }
            // Configuration changed; restart the wait with the new timeout.
            continue;
        }
        let max_idle = state.max_idle_time;
        if max_idle.is_zero() {
            continue;
        }
        state.reap_idle(Instant::now(), max_idle);
        state.assert_invariants();
    }
    tracing::debug!("idle reaper stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::{CloseCallback, SpawnError};
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct TestWorker {
        pid: u32,
        app_root: String,
    }

    impl WorkerHandle for TestWorker {
        fn pid(&self) -> u32 {
            self.pid
        }
        fn app_root(&self) -> &str {
            &self.app_root
        }
        fn connect(&self, on_close: CloseCallback) -> io::Result<Session> {
            Ok(Session::new(
                self.pid,
                Box::new(io::Cursor::new(Vec::new())),
                on_close,
            ))
        }
    }

    struct TestSpawner {
        next_pid: AtomicU32,
    }

    impl TestSpawner {
        fn new() -> Self {
            Self {
                next_pid: AtomicU32::new(1),
            }
        }
    }

    impl Spawner for TestSpawner {
        fn spawn(
            &self,
            options: &PoolOptions,
        ) -> std::result::Result<Arc<dyn WorkerHandle>, SpawnError> {
            Ok(Arc::new(TestWorker {
                pid: self.next_pid.fetch_add(1, Ordering::SeqCst),
                app_root: options.app_root.clone(),
            }))
        }
        fn reload(&self, _app_root: &str) {}
        fn server_pid(&self) -> u32 {
            999
        }
    }

    fn app_options(root: &tempfile::TempDir) -> PoolOptions {
        PoolOptions::new(root.path().to_str().unwrap())
    }

    #[test]
    fn released_workers_queue_session_free_first() {
        let root = tempfile::TempDir::new().unwrap();
        let pool = Pool::new(Arc::new(TestSpawner::new()));
        let options = app_options(&root);

        let session_a = pool.get(&options).unwrap();
        let session_b = pool.get(&options).unwrap();
        assert_eq!(pool.count(), 2);
        assert_eq!(pool.active(), 2);

        drop(session_a);
        assert_eq!(pool.active(), 1);

        // The released worker moved to the group front and the idle tail.
        let snapshot = pool.snapshot();
        let processes = &snapshot.groups[0].processes;
        assert_eq!(processes[0].sessions, 0);
        assert_eq!(processes[1].sessions, 1);
        assert_eq!(processes[1].pid, session_b.pid());
        assert_eq!(snapshot.inactive, 1);
    }

    #[test]
    fn reaper_scan_retires_only_expired_idle_workers() {
        let root_a = tempfile::TempDir::new().unwrap();
        let root_b = tempfile::TempDir::new().unwrap();
        let pool = Pool::new(Arc::new(TestSpawner::new()));

        pool.get(&app_options(&root_a)).unwrap().close();
        let held = pool.get(&app_options(&root_b)).unwrap();
        assert_eq!(pool.count(), 2);

        {
            let mut state = pool.shared.state.lock();
            // Pretend two minutes pass: the idle worker for `root_a`
            // expires, the active one for `root_b` is untouchable.
            state.reap_idle(Instant::now() + Duration::from_secs(120), Duration::from_secs(60));
            state.assert_invariants();
        }

        assert_eq!(pool.count(), 1);
        let snapshot = pool.snapshot();
        assert_eq!(snapshot.groups.len(), 1);
        assert_eq!(snapshot.groups[0].processes[0].pid, held.pid());
    }

    #[test]
    fn reaper_scan_honors_the_threshold() {
        let root = tempfile::TempDir::new().unwrap();
        let pool = Pool::new(Arc::new(TestSpawner::new()));
        pool.get(&app_options(&root)).unwrap().close();

        {
            let mut state = pool.shared.state.lock();
            state.reap_idle(Instant::now() + Duration::from_secs(30), Duration::from_secs(60));
        }
        assert_eq!(pool.count(), 1);
    }

    #[test]
    fn clear_invalidates_outstanding_close_callbacks() {
        let root = tempfile::TempDir::new().unwrap();
        let pool = Pool::new(Arc::new(TestSpawner::new()));
        let session = pool.get(&app_options(&root)).unwrap();
        assert_eq!(pool.count(), 1);

        pool.clear();
        assert_eq!(pool.count(), 0);
        assert_eq!(pool.active(), 0);

        // The close callback of the orphaned session resolves nothing.
        drop(session);
        assert_eq!(pool.count(), 0);
        assert_eq!(pool.active(), 0);
        pool.shared.state.lock().assert_invariants();
    }

    #[test]
    fn setters_take_effect_under_the_lock() {
        let pool = Pool::new(Arc::new(TestSpawner::new()));
        pool.set_max(3);
        pool.set_max_per_app(2);
        pool.set_max_idle_time(7);

        let state = pool.shared.state.lock();
        assert_eq!(state.max, 3);
        assert_eq!(state.max_per_app, 2);
        assert_eq!(state.max_idle_time, Duration::from_secs(7));
    }
}
