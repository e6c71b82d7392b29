//! Error types for roost.
//!
//! Errors carry the application root they relate to so that a server
//! operator can tell which of many hosted applications is misbehaving.

use thiserror::Error;

/// The main error type for roost operations.
#[derive(Error, Debug)]
pub enum RoostError {
    // =========================================================================
    // Dispatch Errors (E101-E199)
    // =========================================================================
    /// The spawner failed to start a worker process.
    #[error("E101: Cannot spawn application '{app_root}': {cause}")]
    SpawnFailed {
        /// The application root the spawn was for.
        app_root: String,
        /// Reason for the spawn failure.
        cause: String,
        /// HTML error page produced by the spawner, if any. Preserved so
        /// the server can render it to the end user.
        error_page: Option<String>,
    },

    /// A freshly checked-out worker refused the session handshake and the
    /// retry budget ran out.
    #[error(
        "E102: Cannot connect to an existing application instance for \
         '{app_root}' after {attempts} attempts: {cause}"
    )]
    ConnectFailed {
        /// The application root the session was for.
        app_root: String,
        /// How many checkout attempts were made before giving up.
        attempts: u32,
        /// Reason for the last handshake failure.
        cause: String,
    },
}

impl RoostError {
    /// Get the error code (e.g., "E101").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::SpawnFailed { .. } => "E101",
            Self::ConnectFailed { .. } => "E102",
        }
    }

    /// Check if this error is retriable.
    ///
    /// Spawn failures are transient (the application may simply be slow to
    /// boot); a connect failure already consumed the whole retry budget.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::SpawnFailed { .. })
    }

    /// The error page payload carried by a spawn failure, if any.
    #[must_use]
    pub fn error_page(&self) -> Option<&str> {
        match self {
            Self::SpawnFailed { error_page, .. } => error_page.as_deref(),
            Self::ConnectFailed { .. } => None,
        }
    }
}

/// Result type alias using `RoostError`.
pub type Result<T> = std::result::Result<T, RoostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_correct() {
        let err = RoostError::SpawnFailed {
            app_root: "/srv/app".to_string(),
            cause: "boot timed out".to_string(),
            error_page: None,
        };
        assert_eq!(err.code(), "E101");

        let err = RoostError::ConnectFailed {
            app_root: "/srv/app".to_string(),
            attempts: 10,
            cause: "connection refused".to_string(),
        };
        assert_eq!(err.code(), "E102");
    }

    #[test]
    fn error_display() {
        let err = RoostError::SpawnFailed {
            app_root: "/srv/app".to_string(),
            cause: "exit status 1".to_string(),
            error_page: Some("<html>boom</html>".to_string()),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("E101"));
        assert!(msg.contains("/srv/app"));
        assert!(msg.contains("exit status 1"));
    }

    #[test]
    fn retriable_errors() {
        assert!(
            RoostError::SpawnFailed {
                app_root: "/srv/app".to_string(),
                cause: "slow boot".to_string(),
                error_page: None,
            }
            .is_retriable()
        );

        assert!(
            !RoostError::ConnectFailed {
                app_root: "/srv/app".to_string(),
                attempts: 10,
                cause: "refused".to_string(),
            }
            .is_retriable()
        );
    }

    #[test]
    fn error_page_is_preserved() {
        let err = RoostError::SpawnFailed {
            app_root: "/srv/app".to_string(),
            cause: "boom".to_string(),
            error_page: Some("<html>details</html>".to_string()),
        };
        assert_eq!(err.error_page(), Some("<html>details</html>"));
    }
}
