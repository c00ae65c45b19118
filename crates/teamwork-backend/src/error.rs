//! Error types for permission resolution
//!
//! Resolution itself degrades to "no permission" for unknown objects and
//! broken hierarchies; the errors here cover the remaining failures:
//! custom permission logic and configuration.

use thiserror::Error;

use crate::config::ConfigError;
use crate::logic::LogicError;

/// Backend error types.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A custom permission logic hook failed
    #[error("Permission logic failed on {object} for {codename}: {source}")]
    Logic {
        /// Object the hook was consulted for
        object: String,
        /// Codename the hook was consulted for
        codename: String,
        /// Hook error
        #[source]
        source: LogicError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

impl BackendError {
    /// Check if this error should be logged at error level.
    ///
    /// Hook and configuration failures are defects in the hosting
    /// application.
    pub fn is_server_error(&self) -> bool {
        matches!(self, BackendError::Logic { .. } | BackendError::Config(_))
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            BackendError::Logic { .. } => "PERMISSION_LOGIC_FAILED",
            BackendError::Config(_) => "CONFIG_ERROR",
        }
    }
}
