//! Queued request and failure types

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use restorekit_common::error::{ErrorClassification, ErrorSeverity};
use restorekit_domain::{RestoreKitError, Result};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Executes one dispatched request against the remote service
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &DispatchRequest) -> Result<DispatchResponse>;
}

/// Receives failures of requests that carry no handler of their own
pub trait ErrorReceiver: Send + Sync {
    fn on_error(&self, failure: &DispatchFailure);
}

impl<F> ErrorReceiver for F
where
    F: Fn(&DispatchFailure) + Send + Sync,
{
    fn on_error(&self, failure: &DispatchFailure) {
        self(failure);
    }
}

/// Default receiver: log and move on.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorReceiver;

impl ErrorReceiver for LogErrorReceiver {
    fn on_error(&self, failure: &DispatchFailure) {
        warn!(
            request_id = failure.request_id,
            method = %failure.method,
            path = %failure.path,
            error = %failure.cause,
            severity = %failure.cause.severity(),
            "dispatched request failed"
        );
    }
}

/// A request waiting in, or taken from, the dispatch queue
#[derive(Clone)]
pub struct DispatchRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub(crate) on_error: Option<Arc<dyn ErrorReceiver>>,
}

impl DispatchRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None, on_error: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Route this request's failure to `handler` instead of the
    /// dispatcher-wide receiver.
    pub fn on_error(mut self, handler: impl ErrorReceiver + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for DispatchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("has_body", &self.body.is_some())
            .field("has_handler", &self.on_error.is_some())
            .finish()
    }
}

/// Successful response of a dispatched request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    pub status: u16,
    pub body: Bytes,
}

impl DispatchResponse {
    /// Decode the body, unwrapping the `data` envelope when present.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let mut value: serde_json::Value = serde_json::from_slice(&self.body)?;
        if let Some(data) = value.get_mut("data") {
            return Ok(serde_json::from_value(data.take())?);
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Why a dispatched request did not complete
#[derive(Debug, Clone, PartialEq)]
pub enum FailureCause {
    Error(RestoreKitError),
    Panic(String),
}

impl FailureCause {
    /// Panics rank as critical; errors keep their own grading.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Error(err) => err.severity(),
            Self::Panic(_) => ErrorSeverity::Critical,
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(err) => write!(f, "{err}"),
            Self::Panic(message) => write!(f, "request panicked: {message}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchFailure {
    pub request_id: u64,
    pub method: Method,
    pub path: String,
    pub cause: FailureCause,
}
