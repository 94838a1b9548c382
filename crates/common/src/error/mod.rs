//! Error types shared by the RestoreKit crates
//!
//! `CommonError` covers the failures the shared configuration and
//! serialization code can produce. Crate-specific errors (`RestoreKitError`,
//! `ApiError`) convert from it and implement `ErrorClassification`, which
//! the dispatcher uses to grade failures when logging them.
//!
//! ```rust,ignore
//! use restorekit_common::error::{CommonError, CommonResult};
//!
//! fn parse_settings(raw: &str) -> CommonResult<Settings> {
//!     toml::from_str(raw).map_err(CommonError::from)
//! }
//! ```

use std::fmt;
use std::time::Duration;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Invalid or missing configuration, optionally naming the dotted field
    Config { message: String, field: Option<String> },

    /// A payload or file could not be decoded
    Serialization { message: String, format: Option<String> },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message, field: Some(field) } => {
                write!(f, "invalid configuration `{field}`: {message}")
            }
            Self::Config { message, field: None } => write!(f, "invalid configuration: {message}"),
            Self::Serialization { message, format: Some(format) } => {
                write!(f, "{format} parsing failed: {message}")
            }
            Self::Serialization { message, format: None } => write!(f, "parsing failed: {message}"),
        }
    }
}

impl std::error::Error for CommonError {}

impl CommonError {
    /// Configuration error tied to a dotted field name such as `api.base_url`
    pub fn config_field<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    pub fn serialization_format<F: Into<String>, S: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { message: message.into(), format: Some(format.into()) }
    }
}

/// Uniform retry and severity questions asked of any error in the workspace
pub trait ErrorClassification {
    /// Whether repeating the same operation may succeed
    fn is_retryable(&self) -> bool;

    fn severity(&self) -> ErrorSeverity;

    fn is_critical(&self) -> bool;

    /// Delay suggested by the failure itself, if any
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        })
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_format("JSON", err.to_string())
    }
}

impl From<toml::de::Error> for CommonError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization_format("TOML", err.to_string())
    }
}
