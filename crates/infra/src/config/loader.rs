//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Variables from a `.env` file in the working directory are added to the
//!    process environment (existing variables win)
//! 2. If `RESTOREKIT_API_BASE_URL` is set, the configuration comes from the
//!    environment
//! 3. Otherwise the first config file found by [`probe_config_paths`] is read
//! 4. The result is validated before it is returned
//!
//! ## Environment Variables
//! - `RESTOREKIT_API_BASE_URL` (required for env loading)
//! - `RESTOREKIT_API_TIMEOUT_MS`, `RESTOREKIT_API_MAX_ATTEMPTS`,
//!   `RESTOREKIT_API_BASE_BACKOFF_MS`, `RESTOREKIT_API_USER_AGENT`,
//!   `RESTOREKIT_API_PROXY`
//! - `RESTOREKIT_JOB_POLLING_INTERVAL_MS`, `RESTOREKIT_JOB_TIMEOUT_MS`,
//!   `RESTOREKIT_FILE_SIZE_POLL_INTERVAL_MS`
//! - `RESTOREKIT_DISPATCHER_WORKERS`, `RESTOREKIT_DISPATCHER_MAX_RPS`,
//!   `RESTOREKIT_DISPATCHER_QUEUE_CAPACITY`
//! - `RESTOREKIT_LOG_FILTER`, `RESTOREKIT_LOG_JSON`
//!
//! Unset optional variables keep their defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use restorekit_common::error::{CommonError, CommonResult};
use restorekit_domain::{RestoreKitConfig, RestoreKitError, Result};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["config.json", "config.toml", "restorekit.json", "restorekit.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `RestoreKitError::Config` if no source yields a valid
/// configuration.
pub fn load() -> Result<RestoreKitConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `RestoreKitError::Config` if `RESTOREKIT_API_BASE_URL` is missing
/// or a variable has an unparseable value.
pub fn load_from_env() -> Result<RestoreKitConfig> {
    let mut config = RestoreKitConfig::default();

    config.api.base_url = env_var("RESTOREKIT_API_BASE_URL")?;
    if let Some(timeout) = env_millis("RESTOREKIT_API_TIMEOUT_MS")? {
        config.api.timeout = timeout;
    }
    if let Some(attempts) = env_parse("RESTOREKIT_API_MAX_ATTEMPTS")? {
        config.api.max_attempts = attempts;
    }
    if let Some(backoff) = env_millis("RESTOREKIT_API_BASE_BACKOFF_MS")? {
        config.api.base_backoff = backoff;
    }
    if let Ok(agent) = std::env::var("RESTOREKIT_API_USER_AGENT") {
        config.api.user_agent = agent;
    }
    config.api.proxy = std::env::var("RESTOREKIT_API_PROXY").ok().filter(|p| !p.is_empty());

    if let Some(interval) = env_millis("RESTOREKIT_JOB_POLLING_INTERVAL_MS")? {
        config.restore.job_polling_interval = interval;
    }
    config.restore.job_timeout = env_millis("RESTOREKIT_JOB_TIMEOUT_MS")?;
    if let Some(interval) = env_millis("RESTOREKIT_FILE_SIZE_POLL_INTERVAL_MS")? {
        config.restore.file_size_poll_interval = interval;
    }

    if let Some(workers) = env_parse("RESTOREKIT_DISPATCHER_WORKERS")? {
        config.dispatcher.concurrent_workers = workers;
    }
    if let Some(rps) = env_parse("RESTOREKIT_DISPATCHER_MAX_RPS")? {
        config.dispatcher.max_requests_per_second = rps;
    }
    if let Some(capacity) = env_parse("RESTOREKIT_DISPATCHER_QUEUE_CAPACITY")? {
        config.dispatcher.queue_capacity = capacity;
    }

    if let Ok(filter) = std::env::var("RESTOREKIT_LOG_FILTER") {
        config.logging.filter = filter;
    }
    config.logging.json = env_bool("RESTOREKIT_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. The format follows
/// the file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `RestoreKitError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<RestoreKitConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(RestoreKitError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            RestoreKitError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| RestoreKitError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<RestoreKitConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let parsed: CommonResult<RestoreKitConfig> = match extension {
        "toml" => toml::from_str(contents).map_err(CommonError::from),
        "json" => serde_json::from_str(contents).map_err(CommonError::from),
        _ => {
            return Err(RestoreKitError::Config(format!(
                "Unsupported config format: {}",
                extension
            )))
        }
    };

    parsed.map_err(|e| RestoreKitError::Config(format!("{}: {}", path.display(), e)))
}

/// Probe the standard locations for a configuration file
///
/// Searches the working directory and up to two parents, then the
/// executable's directory and up to two parents, for `config.{json,toml}`
/// and `restorekit.{json,toml}`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| [root.clone(), root.join(".."), root.join("../..")])
        .flat_map(|dir| CONFIG_FILE_NAMES.map(|name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        RestoreKitError::Config(format!("Missing required environment variable: {}", key))
    })
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| RestoreKitError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

fn env_millis(key: &str) -> Result<Option<Duration>> {
    Ok(env_parse::<u64>(key)?.map(Duration::from_millis))
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
