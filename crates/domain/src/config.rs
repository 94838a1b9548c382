//! Configuration structures
//!
//! Every knob the restore pipeline reads lives here and is handed to
//! constructors explicitly. Intervals are written in milliseconds in config
//! files and environment variables and exposed as `Duration`.

use std::time::Duration;

use restorekit_common::error::{CommonError, CommonResult};
use restorekit_common::{duration_millis, option_duration_millis};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_TIMEOUT_MS, DEFAULT_BASE_BACKOFF_MS, DEFAULT_CONCURRENT_WORKERS,
    DEFAULT_FILE_SIZE_POLL_INTERVAL_MS, DEFAULT_JOB_POLLING_INTERVAL_MS, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_REQUESTS_PER_SECOND, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_USER_AGENT,
};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestoreKitConfig {
    pub api: ApiConfig,
    pub restore: RestoreConfig,
    pub dispatcher: DispatcherConfig,
    pub logging: LoggingConfig,
}

impl RestoreKitConfig {
    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `CommonError::Config` naming the first offending field.
    pub fn validate(&self) -> CommonResult<()> {
        self.api.validate()?;
        self.restore.validate()?;
        self.dispatcher.validate()?;
        if self.logging.filter.trim().is_empty() {
            return Err(CommonError::config_field("logging.filter", "must not be empty"));
        }
        Ok(())
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(rename = "timeout_ms", with = "duration_millis")]
    pub timeout: Duration,
    /// Total attempts per request, including the first one.
    pub max_attempts: u32,
    #[serde(rename = "base_backoff_ms", with = "duration_millis")]
    pub base_backoff: Duration,
    pub user_agent: String,
    pub proxy: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_millis(DEFAULT_API_TIMEOUT_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: Duration::from_millis(DEFAULT_BASE_BACKOFF_MS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
        }
    }
}

impl ApiConfig {
    fn validate(&self) -> CommonResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(CommonError::config_field("api.base_url", "must not be empty"));
        }
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| CommonError::config_field("api.base_url", e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CommonError::config_field(
                "api.base_url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }
        if self.max_attempts == 0 {
            return Err(CommonError::config_field("api.max_attempts", "must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(CommonError::config_field("api.timeout_ms", "must be greater than 0"));
        }
        if let Some(proxy) = &self.proxy {
            url::Url::parse(proxy).map_err(|e| CommonError::config_field("api.proxy", e.to_string()))?;
        }
        Ok(())
    }
}

/// Restore polling behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestoreConfig {
    #[serde(rename = "job_polling_interval_ms", with = "duration_millis")]
    pub job_polling_interval: Duration,
    /// Upper bound on waiting for a restore job. `None` waits until the job
    /// finishes or the caller cancels.
    #[serde(rename = "job_timeout_ms", with = "option_duration_millis")]
    pub job_timeout: Option<Duration>,
    #[serde(rename = "file_size_poll_interval_ms", with = "duration_millis")]
    pub file_size_poll_interval: Duration,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            job_polling_interval: Duration::from_millis(DEFAULT_JOB_POLLING_INTERVAL_MS),
            job_timeout: None,
            file_size_poll_interval: Duration::from_millis(DEFAULT_FILE_SIZE_POLL_INTERVAL_MS),
        }
    }
}

impl RestoreConfig {
    fn validate(&self) -> CommonResult<()> {
        if self.job_timeout.is_some_and(|t| t.is_zero()) {
            return Err(CommonError::config_field(
                "restore.job_timeout_ms",
                "must be greater than 0 when set",
            ));
        }
        Ok(())
    }
}

/// Fire-and-forget request dispatcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub concurrent_workers: usize,
    pub max_requests_per_second: f64,
    pub queue_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            concurrent_workers: DEFAULT_CONCURRENT_WORKERS,
            max_requests_per_second: DEFAULT_MAX_REQUESTS_PER_SECOND,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl DispatcherConfig {
    /// Minimum time each worker spends per request so that all workers
    /// together stay near `max_requests_per_second`.
    ///
    /// Zero when the rate is not a positive finite number; [`Self::validate`]
    /// rejects such configurations.
    pub fn min_request_interval(&self) -> Duration {
        let workers = self.concurrent_workers.max(1) as f64;
        Duration::try_from_secs_f64(workers / self.max_requests_per_second)
            .unwrap_or(Duration::ZERO)
    }

    /// # Errors
    /// Returns `CommonError::Config` naming the first offending field.
    pub fn validate(&self) -> CommonResult<()> {
        if self.concurrent_workers == 0 {
            return Err(CommonError::config_field(
                "dispatcher.concurrent_workers",
                "must be at least 1",
            ));
        }
        if !self.max_requests_per_second.is_finite() || self.max_requests_per_second <= 0.0 {
            return Err(CommonError::config_field(
                "dispatcher.max_requests_per_second",
                "must be a positive number",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(CommonError::config_field(
                "dispatcher.queue_capacity",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `"info,restorekit_core=debug"`
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: DEFAULT_LOG_FILTER.to_string(), json: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RestoreKitConfig {
        RestoreKitConfig {
            api: ApiConfig { base_url: "https://console.example.com".into(), ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = RestoreKitConfig::default();
        assert_eq!(config.restore.job_polling_interval, Duration::from_secs(1));
        assert_eq!(config.restore.file_size_poll_interval, Duration::from_secs(1));
        assert_eq!(config.restore.job_timeout, None);
        assert_eq!(config.dispatcher.concurrent_workers, 4);
        assert_eq!(config.dispatcher.queue_capacity, 1024);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn min_request_interval_spreads_rate_across_workers() {
        let dispatcher = DispatcherConfig {
            concurrent_workers: 4,
            max_requests_per_second: 20.0,
            queue_capacity: 8,
        };
        assert_eq!(dispatcher.min_request_interval(), Duration::from_millis(200));
    }

    #[test]
    fn min_request_interval_is_total() {
        let zero_rate = DispatcherConfig { max_requests_per_second: 0.0, ..DispatcherConfig::default() };
        assert_eq!(zero_rate.min_request_interval(), Duration::ZERO);
        assert!(zero_rate.validate().is_err());

        let no_workers = DispatcherConfig {
            concurrent_workers: 0,
            max_requests_per_second: 10.0,
            queue_capacity: 8,
        };
        assert_eq!(no_workers.min_request_interval(), Duration::from_millis(100));
    }

    #[test]
    fn validate_accepts_minimal_config() {
        valid().validate().unwrap();
    }

    #[test]
    fn validate_rejects_missing_base_url() {
        let err = RestoreKitConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("api.base_url"));
    }

    #[test]
    fn validate_rejects_zero_rate() {
        let mut config = valid();
        config.dispatcher.max_requests_per_second = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("dispatcher.max_requests_per_second"));
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: RestoreKitConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://console.example.com"
            timeout_ms = 5000

            [restore]
            job_timeout_ms = 600000
            "#,
        )
        .unwrap();

        assert_eq!(config.api.timeout, Duration::from_secs(5));
        assert_eq!(config.api.max_attempts, 3);
        assert_eq!(config.restore.job_timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.restore.job_polling_interval, Duration::from_secs(1));
        config.validate().unwrap();
    }
}
