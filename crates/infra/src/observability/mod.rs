//! Logging setup driven by configuration

use restorekit_common::observability::init_tracing;
use restorekit_domain::{LoggingConfig, Result};

/// Install the global tracing subscriber described by `config`.
///
/// Returns `Ok(false)` when a subscriber was already installed.
///
/// # Errors
/// Returns `RestoreKitError::Config` when the filter cannot be parsed.
pub fn init_logging(config: &LoggingConfig) -> Result<bool> {
    let installed = init_tracing(&config.filter, config.json)?;
    if installed {
        tracing::debug!(filter = %config.filter, json = config.json, "logging initialised");
    }
    Ok(installed)
}
