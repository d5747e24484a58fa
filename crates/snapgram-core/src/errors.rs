//! Error types for the collaborator boundary and configuration
//!
//! A collaborator call has three outcomes: a value, a silent failure (`None`),
//! or a rejection. Only rejections are represented here; silent failures are
//! carried as `Ok(None)` so the mutation layer can tell them apart.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rejection raised by the backend or by the local plumbing in front of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum BackendError {
    /// Transport failed or timed out
    #[error("Network error: {message}")]
    Network {
        /// Description of what failed on the wire
        message: String,
    },

    /// No valid session, or the session lacks permission
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the session was refused
        message: String,
    },

    /// Referenced record does not exist
    #[error("Not found: {message}")]
    NotFound {
        /// Description of what was looked up
        message: String,
    },

    /// Record already exists (e.g. duplicate email)
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflicting record
        message: String,
    },

    /// Upload refused by the media collaborator (format, size)
    #[error("Media rejected: {message}")]
    MediaRejected {
        /// Description of why the file was refused
        message: String,
    },

    /// Persisting state failed
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the failed write
        message: String,
    },

    /// Anything else
    #[error("Internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

impl BackendError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a media rejected error
    pub fn media_rejected(message: impl Into<String>) -> Self {
        Self::MediaRejected {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Transient failures may succeed if the user retries unchanged.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Storage { .. })
    }
}

/// Result of a single collaborator or facade call.
pub type BackendResult<T> = Result<Option<T>, BackendError>;

/// Configuration loading and validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`SnapgramConfig`](crate::SnapgramConfig)
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File that was parsed
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// A field is out of range
    #[error("invalid config field '{field}': {message}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
}

impl ConfigError {
    /// Create an invalid field error
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}
