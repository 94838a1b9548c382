//! # RestoreKit Infrastructure
//!
//! Infrastructure implementations of the `restorekit-core` ports.
//!
//! This crate contains:
//! - The reqwest-based HTTP transport with retry and backoff
//! - The storage service API adapter (`StorageApiClient`)
//! - The fire-and-forget request dispatcher
//! - Configuration loading and logging setup
//!
//! ## Architecture
//! - Implements traits defined in `restorekit-core`
//! - Contains all "impure" code (network, environment, files)

pub mod api;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{AccessTokenProvider, ApiError, StaticTokenProvider, StorageApiClient};
pub use dispatch::{
    AsyncRequestDispatcher, DispatchFailure, DispatchRequest, DispatchResponse, ErrorReceiver,
    FailureCause, RequestExecutor,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::init_logging;
