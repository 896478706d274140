//! # Sync Error Types
//!
//! Error types for the async layer.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       medi-sync Error Categories                        │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Run control   │  │     RemoteError         │ │
//! │  │                 │  │                 │  │  (one remote call)      │ │
//! │  │  InvalidConfig  │  │  AlreadyRunning │  │  Timeout                │ │
//! │  │  InvalidUrl     │  │  Catalog        │  │  Network                │ │
//! │  │  ConfigLoad/Save│  │  Database       │  │  Rejected               │ │
//! │  └─────────────────┘  └─────────────────┘  │  Decode, InvalidRequest │ │
//! │                                            └─────────────────────────┘ │
//! │                                                                         │
//! │  RemoteError never escapes the orchestrator or the facade: it is       │
//! │  retried, recorded per record, or replaced by the local answer.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use thiserror::Error;

/// Result type alias for configuration and run-control operations.
pub type MediResult<T> = Result<T, SyncError>;

/// Result type of a single remote catalog call.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors raised by the async layer itself.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Remote base URL could not be parsed or has the wrong scheme.
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Run Control
    // =========================================================================
    /// A sync run is already in progress in this process.
    ///
    /// ## When This Occurs
    /// `SyncOrchestrator::run` was called while another run on the same
    /// orchestrator had not finished yet.
    #[error("A catalog sync is already running")]
    AlreadyRunning,

    /// The bundled catalog failed its integrity checks.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Local canonical store error.
    #[error("Database error: {0}")]
    Database(String),

    /// Remote client could not be constructed.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Failure of one call against the Remote Catalog Client.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The call did not finish within the request timeout.
    #[error("Remote call timed out after {after:?}")]
    Timeout { after: Duration },

    /// Transport-level failure (DNS, connection reset, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered but refused the request.
    ///
    /// `status` is the HTTP status when the backend is reached over HTTP.
    #[error("Remote rejected request{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("Malformed remote response: {0}")]
    Decode(String),

    /// The request could not be built (bad endpoint path, bad header value).
    #[error("Invalid remote request: {0}")]
    InvalidRequest(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<medi_core::CoreError> for SyncError {
    fn from(err: medi_core::CoreError) -> Self {
        SyncError::Catalog(err.to_string())
    }
}

impl From<medi_core::ValidationError> for SyncError {
    fn from(err: medi_core::ValidationError) -> Self {
        SyncError::InvalidConfig(err.to_string())
    }
}

impl From<medi_db::DbError> for SyncError {
    fn from(err: medi_db::DbError) -> Self {
        SyncError::Database(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

/// The SQLite canonical store answers like a remote backend would.
impl From<medi_db::DbError> for RemoteError {
    fn from(err: medi_db::DbError) -> Self {
        match err {
            medi_db::DbError::ConnectionFailed(msg) => RemoteError::Network(msg),
            medi_db::DbError::PoolExhausted => {
                RemoteError::Network("connection pool exhausted".to_string())
            }
            other => RemoteError::Rejected {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for RemoteError {
    fn from(err: url::ParseError) -> Self {
        RemoteError::InvalidRequest(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl RemoteError {
    /// Returns true if the failure looks transient.
    ///
    /// ## Retryable Errors
    /// - Timeouts
    /// - Network failures
    /// - HTTP 408, 429 and 5xx rejections
    ///
    /// The orchestrator retries every failed batch regardless; this only
    /// decides how loudly a failure is logged.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Timeout { .. } | RemoteError::Network(_) => true,
            RemoteError::Rejected {
                status: Some(status),
                ..
            } => *status == 408 || *status == 429 || *status >= 500,
            RemoteError::Rejected { status: None, .. }
            | RemoteError::Decode(_)
            | RemoteError::InvalidRequest(_) => false,
        }
    }
}

impl SyncError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(RemoteError::Timeout {
            after: Duration::from_secs(30)
        }
        .is_retryable());
        assert!(RemoteError::Network("connection reset".into()).is_retryable());
        assert!(RemoteError::Rejected {
            status: Some(503),
            message: "unavailable".into()
        }
        .is_retryable());

        assert!(!RemoteError::Rejected {
            status: Some(400),
            message: "bad payload".into()
        }
        .is_retryable());
        assert!(!RemoteError::Decode("expected array".into()).is_retryable());
    }

    #[test]
    fn test_rejected_display_includes_status() {
        let err = RemoteError::Rejected {
            status: Some(409),
            message: "duplicate".into(),
        };
        assert_eq!(err.to_string(), "Remote rejected request (409): duplicate");

        let err = RemoteError::Rejected {
            status: None,
            message: "CHECK constraint failed".into(),
        };
        assert_eq!(err.to_string(), "Remote rejected request: CHECK constraint failed");
    }

    #[test]
    fn test_db_errors_map_to_remote_errors() {
        let err: RemoteError = medi_db::DbError::ConstraintViolation {
            message: "price_min <= price_max".into(),
        }
        .into();
        assert!(matches!(err, RemoteError::Rejected { status: None, .. }));

        let err: RemoteError = medi_db::DbError::ConnectionFailed("closed".into()).into();
        assert!(matches!(err, RemoteError::Network(_)));
    }

    #[test]
    fn test_config_error_category() {
        assert!(SyncError::InvalidConfig("batch_size".into()).is_config_error());
        assert!(!SyncError::AlreadyRunning.is_config_error());
    }
}
