use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, Proxy, RequestBuilder, Response};
use restorekit_domain::{ApiConfig, RestoreKitError};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// Attempt budget and exponential backoff for one logical request.
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based), doubling each time.
    fn delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(8);
        self.base_backoff.saturating_mul(1 << exponent)
    }

    fn has_budget_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// reqwest client wrapper that retries transient failures.
///
/// Only idempotent methods are replayed: connect failures, timeouts and 5xx
/// responses are retried until the attempt budget is spent. A POST is sent
/// exactly once so a job the server already accepted is never created twice.
/// Any other response is handed back untouched so the caller maps its status.
///
/// The configured timeout bounds connecting and, for [`Self::request`], the
/// whole response. [`Self::streaming_request`] only bounds connecting.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    request_timeout: Duration,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Build a client from the `api` section of the configuration.
    pub fn from_config(config: &ApiConfig) -> Result<Self, RestoreKitError> {
        let mut builder = Self::builder()
            .timeout(config.timeout)
            .max_attempts(config.max_attempts)
            .base_backoff(config.base_backoff)
            .user_agent(config.user_agent.clone());
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(proxy.clone());
        }
        builder.build()
    }

    /// Request whose complete response, body included, must arrive within
    /// the configured timeout.
    pub fn request<U: reqwest::IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client.request(method, url).timeout(self.request_timeout)
    }

    /// Request for a body the caller consumes as a stream. No deadline
    /// applies once the connection is up.
    pub fn streaming_request<U: reqwest::IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send `builder`, retrying transient failures of idempotent requests.
    ///
    /// The body must be clonable (JSON and byte bodies are); streaming
    /// bodies are rejected with `Internal`. When retries run out on a 5xx
    /// the last response is returned rather than an error.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, RestoreKitError> {
        let mut attempt = 1;
        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| {
                    RestoreKitError::Internal("request body cannot be replayed for retries".into())
                })?
                .build()
                .map_err(to_restore_error)?;
            let method = request.method().clone();
            let url = request.url().clone();
            let replayable = method.is_idempotent() && self.retry.has_budget_after(attempt);
            debug!(attempt, %method, %url, "sending HTTP request");

            let retry_reason = match self.client.execute(request).await {
                Ok(response) if response.status().is_server_error() && replayable => {
                    response.status().to_string()
                }
                Ok(response) => {
                    debug!(attempt, %method, %url, status = %response.status(), "received HTTP response");
                    return Ok(response);
                }
                Err(err) if is_transient(&err) && replayable => err.to_string(),
                Err(err) => return Err(to_restore_error(err)),
            };

            let delay = self.retry.delay(attempt);
            warn!(attempt, %method, %url, reason = %retry_reason, ?delay, "retrying HTTP request");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

/// Builder for [`HttpClient`], seeded from [`ApiConfig::default`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    retry: RetryPolicy,
    user_agent: Option<String>,
    proxy: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        let api = ApiConfig::default();
        Self {
            timeout: api.timeout,
            retry: RetryPolicy { max_attempts: api.max_attempts, base_backoff: api.base_backoff },
            user_agent: None,
            proxy: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts including the first one. Zero is treated as one.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.retry.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.retry.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Route every request through `proxy_url`. Without it the client
    /// ignores system proxy settings.
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy = Some(proxy_url.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, RestoreKitError> {
        let mut builder = ReqwestClient::builder().connect_timeout(self.timeout);

        builder = match self.proxy {
            Some(proxy_url) => builder.proxy(Proxy::all(&proxy_url).map_err(|err| {
                RestoreKitError::Config(format!("invalid proxy '{proxy_url}': {err}"))
            })?),
            None => builder.no_proxy(),
        };
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(to_restore_error)?;
        Ok(HttpClient { client, request_timeout: self.timeout, retry: self.retry })
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

fn to_restore_error(err: reqwest::Error) -> RestoreKitError {
    InfraError::from(err).into()
}
