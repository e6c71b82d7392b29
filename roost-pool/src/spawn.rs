//! The pool's view of the spawning subsystem.
//!
//! How a worker process actually gets started (preloading, direct exec,
//! chroot, control groups) is somebody else's problem; the pool only needs
//! the three operations on [`Spawner`] and the per-worker handle it hands
//! back. Production wires in the real spawn manager, tests wire in a
//! deterministic double.

use crate::options::PoolOptions;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;
use thiserror::Error;

/// Callback fired exactly once when a session is closed or dropped.
pub type CloseCallback = Box<dyn FnOnce() + Send + 'static>;

/// Error raised by a spawner implementation.
///
/// The pool re-wraps this into `RoostError::SpawnFailed`, prefixing the
/// application root and preserving the error page.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SpawnError {
    /// Human-readable description of the failure.
    pub message: String,
    /// HTML error page produced by the failed boot, if the application
    /// got far enough to render one.
    pub error_page: Option<String>,
}

impl SpawnError {
    /// Create a spawn error with no error page.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_page: None,
        }
    }

    /// Attach an error page payload.
    #[must_use]
    pub fn with_error_page(mut self, page: impl Into<String>) -> Self {
        self.error_page = Some(page.into());
        self
    }
}

/// Starts and reloads worker processes on the pool's behalf.
pub trait Spawner: Send + Sync {
    /// Start a new worker for `options.app_root`.
    fn spawn(&self, options: &PoolOptions) -> Result<Arc<dyn WorkerHandle>, SpawnError>;

    /// Tell the spawning subsystem to forget cached state for an
    /// application (called when its group is restarted).
    fn reload(&self, app_root: &str);

    /// PID of the spawn server itself.
    fn server_pid(&self) -> u32;
}

/// A live worker process as seen by the pool.
///
/// Implementations must not invoke the close callback from `connect`
/// itself: the callback belongs to the session and may only fire when the
/// session ends. On a failed handshake the callback is dropped unused.
pub trait WorkerHandle: Send + Sync {
    /// OS process id of the worker.
    fn pid(&self) -> u32;

    /// The application root this worker serves.
    fn app_root(&self) -> &str;

    /// Open a request session to the worker.
    fn connect(&self, on_close: CloseCallback) -> io::Result<Session>;
}

/// Byte channel carrying one request to a worker and its response back.
///
/// The pool is oblivious to what flows over it.
pub trait WorkerChannel: Read + Write + Send {}

impl<T: Read + Write + Send> WorkerChannel for T {}

/// A scoped borrow of a worker for the lifetime of one request.
///
/// Dropping the session (or calling [`close`](Self::close)) fires the
/// close callback the pool attached at checkout, which returns the worker
/// to the free list or retires it.
pub struct Session {
    pid: u32,
    channel: Box<dyn WorkerChannel>,
    on_close: Option<CloseCallback>,
}

impl Session {
    /// Wrap a freshly opened worker channel.
    pub fn new(pid: u32, channel: Box<dyn WorkerChannel>, on_close: CloseCallback) -> Self {
        Self {
            pid,
            channel,
            on_close: Some(on_close),
        }
    }

    /// PID of the worker behind this session.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Close the session, releasing the worker back to the pool.
    ///
    /// Equivalent to dropping the session; provided so call sites can make
    /// the hand-back explicit.
    pub fn close(self) {}
}

impl Read for Session {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.channel.read(buf)
    }
}

impl Write for Session {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.channel.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.channel.flush()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("pid", &self.pid).finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(on_close) = self.on_close.take() {
            tracing::trace!(pid = self.pid, "session closed");
            on_close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn loopback() -> Box<dyn WorkerChannel> {
        Box::new(io::Cursor::new(Vec::new()))
    }

    #[test]
    fn close_callback_fires_once_on_drop() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = Arc::clone(&fired);
        let session = Session::new(
            7,
            loopback(),
            Box::new(move || {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(session.pid(), 7);
        drop(session);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_close_fires_callback() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = Arc::clone(&fired);
        let session = Session::new(
            7,
            loopback(),
            Box::new(move || {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        session.close();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn session_is_a_byte_channel() {
        let mut session = Session::new(1, loopback(), Box::new(|| {}));
        session.write_all(b"ping").unwrap();
        session.flush().unwrap();
    }

    #[test]
    fn spawn_error_carries_the_error_page() {
        let err = SpawnError::new("boot failed").with_error_page("<html>trace</html>");
        assert_eq!(err.to_string(), "boot failed");
        assert_eq!(err.error_page.as_deref(), Some("<html>trace</html>"));
    }
}
