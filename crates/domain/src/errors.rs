//! Error types used throughout the restore pipeline

use std::time::Duration;

use restorekit_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::TreeNode;

/// Main error type for RestoreKit
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum RestoreKitError {
    /// A path segment had no case-insensitive match in the remote listing.
    ///
    /// `path` is the sub-path that was being looked up when resolution
    /// diverged, and `listing` is the level that failed to contain it.
    #[error("Archive file not found on device {device_guid}: {path}")]
    ArchiveFileNotFound { device_guid: String, path: String, listing: Vec<TreeNode> },

    #[error("Bad restore request: {0}")]
    BadRestoreRequest(String),

    #[error("Device not connected: {0}")]
    DeviceNotConnected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for RestoreKit operations
pub type Result<T> = std::result::Result<T, RestoreKitError>;

impl RestoreKitError {
    /// Stable label for structured logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ArchiveFileNotFound { .. } => "archive_file_not_found",
            Self::BadRestoreRequest(_) => "bad_restore_request",
            Self::DeviceNotConnected(_) => "device_not_connected",
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Timeout(_) => "timeout",
            Self::Cancelled(_) => "cancelled",
            Self::Internal(_) => "internal",
        }
    }
}

impl ErrorClassification for RestoreKitError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Cancelled(_) | Self::NotFound(_) => ErrorSeverity::Info,
            Self::Timeout(_) | Self::Network(_) | Self::DeviceNotConnected(_) => {
                ErrorSeverity::Warning
            }
            Self::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl From<CommonError> for RestoreKitError {
    fn from(err: CommonError) -> Self {
        let message = err.to_string();
        match err {
            CommonError::Config { .. } => Self::Config(message),
            CommonError::Serialization { .. } => Self::Internal(message),
        }
    }
}

impl From<serde_json::Error> for RestoreKitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}
